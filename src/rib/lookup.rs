// Route lookup engine with longest prefix matching

use super::{DEFAULT_ROUTE, Rib, Route, iputils};
use crate::error::{RibError, RibResult};
use iputils::IpVersion;

/// Read-only matcher over a borrowed routing table
pub struct RouteEngine<'a> {
    rib: &'a Rib,
}

impl<'a> RouteEngine<'a> {
    pub fn new(rib: &'a Rib) -> Self {
        RouteEngine { rib }
    }

    /// Find the best matching route for a destination using longest prefix matching
    pub fn lookup(&self, destination: &str) -> RibResult<&'a Route> {
        match iputils::validate(destination) {
            Some(IpVersion::V4) => self.lookup_ipv4(destination),
            Some(IpVersion::V6) => self.lookup_ipv6(destination),
            None => Err(RibError::InvalidAddress(destination.to_string())),
        }
    }

    /// IPv4 next hop. Among covering routes the longest prefix wins and an
    /// equal-length later entry never displaces an earlier one. With no
    /// covering route the 0.0.0.0/0.0.0.0 entry is tried.
    pub fn lookup_ipv4(&self, destination: &str) -> RibResult<&'a Route> {
        if self.rib.is_empty() {
            return Err(RibError::NoMatch(destination.to_string()));
        }

        let mut best_match: Option<(&'a Route, u32)> = None;

        for route in self.rib.routes() {
            if !covers(route, destination) {
                continue;
            }
            let prefix_len = route.prefix_len();
            match best_match {
                None => best_match = Some((route, prefix_len)),
                Some((_, current_len)) if prefix_len > current_len => {
                    best_match = Some((route, prefix_len));
                }
                _ => {}
            }
        }

        if let Some((route, prefix_len)) = best_match {
            tracing::debug!(
                "{} matched {}/{} (/{}) via {}",
                destination,
                route.destination,
                route.netmask,
                prefix_len,
                route.gateway
            );
            return Ok(route);
        }

        self.rib
            .find(DEFAULT_ROUTE, DEFAULT_ROUTE)
            .map_err(|_| RibError::NoMatch(destination.to_string()))
    }

    /// IPv6 prefix matching is not supported; every lookup misses.
    pub fn lookup_ipv6(&self, destination: &str) -> RibResult<&'a Route> {
        tracing::debug!("IPv6 lookup for {} is unsupported", destination);
        Err(RibError::NoMatch(destination.to_string()))
    }
}

/// Whether `destination` falls inside the route's network
fn covers(route: &Route, destination: &str) -> bool {
    iputils::network_address(destination, &route.netmask)
        .is_some_and(|network| iputils::equal(&network, &route.destination))
}
