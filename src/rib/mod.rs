// RIB module - route entity, routing table store and table handle

pub mod iputils;
pub mod lookup;
pub mod table_file;

use serde::{Deserialize, Serialize};

use crate::error::{RibError, RibResult};
use iputils::IpVersion;

/// Netmask argument that matches any mask on delete and find
pub const WILDCARD_NETMASK: &str = "*";

/// Default route key consulted when no prefix covers a destination
pub const DEFAULT_ROUTE: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub destination: String,
    pub netmask: String,
    pub gateway: String,
    pub iface: String,
    pub metric: u32,
    pub ip_version: IpVersion,
}

impl Route {
    /// Whether this entry is keyed by `destination`/`netmask`; `*` accepts any mask
    pub fn matches_key(&self, destination: &str, netmask: &str) -> bool {
        iputils::equal(&self.destination, destination)
            && (netmask == WILDCARD_NETMASK || iputils::equal(&self.netmask, netmask))
    }

    /// Prefix length of the stored netmask
    pub fn prefix_len(&self) -> u32 {
        iputils::netmask_to_prefix_length(&self.netmask)
    }
}

/// Ordered routing table. Insertion order is kept because the matcher
/// breaks prefix-length ties in favour of the earlier entry.
#[derive(Debug, Clone, Default)]
pub struct Rib {
    routes: Vec<Route>,
}

impl Rib {
    pub fn new() -> Self {
        Rib { routes: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Append a new route. Nothing is stored unless every check passes.
    pub fn add(
        &mut self,
        destination: &str,
        netmask: &str,
        gateway: &str,
        iface: &str,
        metric: u32,
    ) -> RibResult<()> {
        let version = validate_literal(destination)?;
        let netmask_version = validate_literal(netmask)?;
        let gateway_version = validate_literal(gateway)?;

        if netmask_version != version {
            tracing::debug!("Netmask {} is {}, destination is {}", netmask, netmask_version, version);
            return Err(RibError::InvalidAddress(netmask.to_string()));
        }
        if gateway_version != version {
            tracing::debug!("Gateway {} is {}, destination is {}", gateway, gateway_version, version);
            return Err(RibError::InvalidAddress(gateway.to_string()));
        }

        if self.position(destination, netmask, false).is_some() {
            return Err(RibError::duplicate_record(destination, netmask));
        }

        let route = Route {
            destination: stored_form(destination, version),
            netmask: stored_form(netmask, version),
            gateway: stored_form(gateway, version),
            iface: iface.to_string(),
            metric,
            ip_version: version,
        };
        tracing::debug!(
            "Adding route {}/{} via {} dev {} metric {}",
            route.destination,
            route.netmask,
            route.gateway,
            route.iface,
            route.metric
        );
        self.routes.push(route);
        Ok(())
    }

    /// Remove the first entry matching `destination`/`netmask` (or `*`),
    /// shifting later entries down so their order is unchanged.
    pub fn delete(&mut self, destination: &str, netmask: &str) -> RibResult<Route> {
        let index = self
            .position(destination, netmask, true)
            .ok_or_else(|| RibError::not_exists(destination, netmask))?;

        let removed = self.routes.remove(index);
        tracing::debug!("Deleted route {}/{}", removed.destination, removed.netmask);
        Ok(removed)
    }

    /// Replace mask, gateway, interface and metric of an existing entry.
    /// The destination and the entry's position stay as they are.
    pub fn update(
        &mut self,
        destination: &str,
        netmask: &str,
        new_netmask: &str,
        new_gateway: &str,
        new_iface: &str,
        new_metric: u32,
    ) -> RibResult<()> {
        let netmask_version = validate_literal(new_netmask)?;
        let version = validate_literal(new_gateway)?;

        let index = self
            .position(destination, netmask, false)
            .ok_or_else(|| RibError::not_exists(destination, netmask))?;

        if self.routes[index].ip_version != version {
            tracing::debug!(
                "Gateway {} is {}, route {} is {}",
                new_gateway,
                version,
                destination,
                self.routes[index].ip_version
            );
            return Err(RibError::InvalidAddress(new_gateway.to_string()));
        }
        if netmask_version != version {
            return Err(RibError::InvalidAddress(new_netmask.to_string()));
        }

        // The re-keyed entry must not collide with another one.
        let collides = self.routes.iter().enumerate().any(|(i, other)| {
            i != index && other.matches_key(destination, new_netmask)
        });
        if collides {
            return Err(RibError::duplicate_record(destination, new_netmask));
        }

        let route = &mut self.routes[index];
        route.netmask = stored_form(new_netmask, version);
        route.gateway = stored_form(new_gateway, version);
        route.iface = new_iface.to_string();
        route.metric = new_metric;
        tracing::debug!(
            "Updated route {} -> {} via {} dev {} metric {}",
            route.destination,
            route.netmask,
            route.gateway,
            route.iface,
            route.metric
        );
        Ok(())
    }

    pub fn clear(&mut self) {
        tracing::debug!("Clearing {} route(s)", self.routes.len());
        self.routes.clear();
    }

    /// Exact lookup by `destination`/`netmask`; `*` accepts any mask
    pub fn find(&self, destination: &str, netmask: &str) -> RibResult<&Route> {
        self.position(destination, netmask, true)
            .map(|index| &self.routes[index])
            .ok_or_else(|| RibError::NoMatch(format!("{} {}", destination, netmask)))
    }

    /// Resolve the next hop for `destination` by longest prefix match
    pub fn lookup(&self, destination: &str) -> RibResult<&Route> {
        lookup::RouteEngine::new(self).lookup(destination)
    }

    fn position(&self, destination: &str, netmask: &str, allow_wildcard: bool) -> Option<usize> {
        if !allow_wildcard && netmask == WILDCARD_NETMASK {
            return None;
        }
        self.routes
            .iter()
            .position(|route| route.matches_key(destination, netmask))
    }
}

fn validate_literal(address: &str) -> RibResult<IpVersion> {
    iputils::validate(address).ok_or_else(|| RibError::InvalidAddress(address.to_string()))
}

// Only IPv4 fields are rewritten at store time.
fn stored_form(address: &str, version: IpVersion) -> String {
    match version {
        IpVersion::V4 => iputils::canonicalize(address),
        IpVersion::V6 => address.to_string(),
    }
}

/// Owning handle over a table that may not be loaded.
///
/// Store operations go through [`RibHandle::get`] / [`RibHandle::get_mut`],
/// which report [`RibError::Uninitialized`] once the table has been released.
#[derive(Debug)]
pub struct RibHandle {
    rib: Option<Rib>,
}

impl Default for RibHandle {
    fn default() -> Self {
        Self::init()
    }
}

impl From<Rib> for RibHandle {
    fn from(rib: Rib) -> Self {
        Self::with(rib)
    }
}

impl RibHandle {
    /// Handle owning a fresh, empty table
    pub fn init() -> Self {
        RibHandle { rib: Some(Rib::new()) }
    }

    /// Handle owning an already populated table
    pub fn with(rib: Rib) -> Self {
        RibHandle { rib: Some(rib) }
    }

    /// Handle with no table behind it
    pub fn uninitialized() -> Self {
        RibHandle { rib: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.rib.is_some()
    }

    /// Drop the owned table, if any
    pub fn free(&mut self) -> RibResult<()> {
        self.rib.take().map(|_| ()).ok_or(RibError::Uninitialized)
    }

    /// Install a table, replacing whatever was held
    pub fn replace(&mut self, rib: Rib) {
        self.rib = Some(rib);
    }

    pub fn get(&self) -> RibResult<&Rib> {
        self.rib.as_ref().ok_or(RibError::Uninitialized)
    }

    pub fn get_mut(&mut self) -> RibResult<&mut Rib> {
        self.rib.as_mut().ok_or(RibError::Uninitialized)
    }

    pub fn add(
        &mut self,
        destination: &str,
        netmask: &str,
        gateway: &str,
        iface: &str,
        metric: u32,
    ) -> RibResult<()> {
        self.get_mut()?.add(destination, netmask, gateway, iface, metric)
    }

    pub fn delete(&mut self, destination: &str, netmask: &str) -> RibResult<Route> {
        self.get_mut()?.delete(destination, netmask)
    }

    pub fn update(
        &mut self,
        destination: &str,
        netmask: &str,
        new_netmask: &str,
        new_gateway: &str,
        new_iface: &str,
        new_metric: u32,
    ) -> RibResult<()> {
        self.get_mut()?
            .update(destination, netmask, new_netmask, new_gateway, new_iface, new_metric)
    }

    pub fn clear(&mut self) -> RibResult<()> {
        self.get_mut()?.clear();
        Ok(())
    }

    pub fn find(&self, destination: &str, netmask: &str) -> RibResult<&Route> {
        self.get()?.find(destination, netmask)
    }

    /// Longest prefix match. An unloaded table simply has no route.
    pub fn lookup(&self, destination: &str) -> RibResult<&Route> {
        match &self.rib {
            Some(rib) => rib.lookup(destination),
            None => {
                iputils::validate(destination)
                    .ok_or_else(|| RibError::InvalidAddress(destination.to_string()))?;
                Err(RibError::NoMatch(destination.to_string()))
            }
        }
    }
}
