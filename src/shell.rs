// Interactive command shell over a routing table file

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{Config, DumpFormat};
use crate::error::{AppError, AppResult};
use crate::rib::table_file;
use crate::rib::{Rib, RibHandle, Route, WILDCARD_NETMASK};

const USAGE: &[&str] = &[
    "QUIT - commit changes and leave",
    "ADD <networkAddr> <netmask> <gateway> <iface> <metric> - add a new record in the routing table",
    "DELETE <networkAddr> [<netmask>|*] - delete a record in the routing table",
    "UPDATE <networkAddr> <netmask> <newNetmask> <newGateway> <newIface> <newMetric> - update a record in the routing table",
    "CLEAR - clear routing table",
    "SELECT <networkAddr> [<netmask>|*] - retrieve routing information for a network address",
    "ROUTE <destination> - find gateway for the provided destination",
    "DUMP - dump all the records in the routing table",
    "COMMIT - commit changes to the routing table",
    "ROLLBACK - abort changes to the routing table",
];

const DUMP_HEADER: &str = "destination\tnetmask\tgateway\tiface\tmetric";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add {
        destination: String,
        netmask: String,
        gateway: String,
        iface: String,
        metric: u32,
    },
    Delete {
        destination: String,
        netmask: String,
    },
    Update {
        destination: String,
        netmask: String,
        new_netmask: String,
        new_gateway: String,
        new_iface: String,
        new_metric: u32,
    },
    Clear,
    Select {
        destination: String,
        netmask: String,
    },
    Route {
        destination: String,
    },
    Dump,
    Commit,
    Rollback,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. Keywords are case-insensitive.
    pub fn parse(line: &str) -> AppResult<Command> {
        let mut parts = line.split_whitespace();
        let keyword = parts
            .next()
            .ok_or_else(|| AppError::UnknownCommand(String::new()))?;
        let args: Vec<&str> = parts.collect();

        let command = match keyword.to_ascii_uppercase().as_str() {
            "ADD" => match args.as_slice() {
                [destination, netmask, gateway, iface, metric] => Command::Add {
                    destination: destination.to_string(),
                    netmask: netmask.to_string(),
                    gateway: gateway.to_string(),
                    iface: iface.to_string(),
                    metric: parse_metric(metric)?,
                },
                _ => return Err(AppError::Usage(USAGE[1].to_string())),
            },
            "DELETE" => match args.as_slice() {
                [destination] => Command::Delete {
                    destination: destination.to_string(),
                    netmask: WILDCARD_NETMASK.to_string(),
                },
                [destination, netmask] => Command::Delete {
                    destination: destination.to_string(),
                    netmask: netmask.to_string(),
                },
                _ => return Err(AppError::Usage(USAGE[2].to_string())),
            },
            "UPDATE" => match args.as_slice() {
                [destination, netmask, new_netmask, new_gateway, new_iface, new_metric] => {
                    Command::Update {
                        destination: destination.to_string(),
                        netmask: netmask.to_string(),
                        new_netmask: new_netmask.to_string(),
                        new_gateway: new_gateway.to_string(),
                        new_iface: new_iface.to_string(),
                        new_metric: parse_metric(new_metric)?,
                    }
                }
                _ => return Err(AppError::Usage(USAGE[3].to_string())),
            },
            "SELECT" => match args.as_slice() {
                [destination] => Command::Select {
                    destination: destination.to_string(),
                    netmask: WILDCARD_NETMASK.to_string(),
                },
                [destination, netmask] => Command::Select {
                    destination: destination.to_string(),
                    netmask: netmask.to_string(),
                },
                _ => return Err(AppError::Usage(USAGE[5].to_string())),
            },
            "ROUTE" => match args.as_slice() {
                [destination] => Command::Route {
                    destination: destination.to_string(),
                },
                _ => return Err(AppError::Usage(USAGE[6].to_string())),
            },
            "CLEAR" => Command::Clear,
            "DUMP" => Command::Dump,
            "COMMIT" => Command::Commit,
            "ROLLBACK" => Command::Rollback,
            "HELP" => Command::Help,
            "QUIT" => Command::Quit,
            other => return Err(AppError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}

fn parse_metric(metric: &str) -> AppResult<u32> {
    metric
        .parse()
        .map_err(|_| AppError::Usage(format!("metric must be a non-negative integer, got '{}'", metric)))
}

/// Whether the shell loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub prompt: String,
    pub commit_on_quit: bool,
    pub dump_format: DumpFormat,
}

impl Default for ShellOptions {
    fn default() -> Self {
        ShellOptions {
            prompt: "> ".to_string(),
            commit_on_quit: true,
            dump_format: DumpFormat::Table,
        }
    }
}

impl From<&Config> for ShellOptions {
    fn from(config: &Config) -> Self {
        ShellOptions {
            prompt: config.prompt.clone(),
            commit_on_quit: config.commit_on_quit,
            dump_format: config.dump_format,
        }
    }
}

/// A routing table bound to its backing file
pub struct Session {
    rib: RibHandle,
    table_file: PathBuf,
    options: ShellOptions,
}

impl Session {
    /// Create a table and fill it from `table_file`
    pub fn open(table_file: impl Into<PathBuf>, options: ShellOptions) -> AppResult<Self> {
        let table_file = table_file.into();
        let mut rib = Rib::new();
        table_file::load(&table_file, &mut rib)?;

        Ok(Session {
            rib: RibHandle::with(rib),
            table_file,
            options,
        })
    }

    pub fn rib(&self) -> &RibHandle {
        &self.rib
    }

    pub fn table_file(&self) -> &Path {
        &self.table_file
    }

    /// Run one command, writing its result to `out`
    pub fn execute<W: Write>(&mut self, command: Command, out: &mut W) -> AppResult<Flow> {
        match command {
            Command::Add {
                destination,
                netmask,
                gateway,
                iface,
                metric,
            } => {
                self.rib.add(&destination, &netmask, &gateway, &iface, metric)?;
                writeln!(out, "OK")?;
            }
            Command::Delete {
                destination,
                netmask,
            } => {
                self.rib.delete(&destination, &netmask)?;
                writeln!(out, "OK")?;
            }
            Command::Update {
                destination,
                netmask,
                new_netmask,
                new_gateway,
                new_iface,
                new_metric,
            } => {
                self.rib.update(
                    &destination,
                    &netmask,
                    &new_netmask,
                    &new_gateway,
                    &new_iface,
                    new_metric,
                )?;
                writeln!(out, "OK")?;
            }
            Command::Clear => {
                self.rib.clear()?;
                writeln!(out, "OK")?;
            }
            Command::Select {
                destination,
                netmask,
            } => {
                let route = self.rib.find(&destination, &netmask)?;
                writeln!(out, "{}", render_route(route))?;
            }
            Command::Route { destination } => {
                let route = self.rib.lookup(&destination)?;
                writeln!(out, "{}", render_route(route))?;
            }
            Command::Dump => self.dump(out)?,
            Command::Commit => {
                table_file::save(&self.table_file, self.rib.get()?)?;
                writeln!(out, "OK")?;
            }
            Command::Rollback => {
                self.rollback()?;
                writeln!(out, "Routing table rollbacked!")?;
            }
            Command::Help => write_usage(out)?,
            Command::Quit => {
                writeln!(out, "Closing RIB...")?;
                self.close()?;
                writeln!(out, "RIB closed.")?;
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    /// Read commands from `input` until QUIT or end of input
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> AppResult<()> {
        let mut lines = input.lines();

        loop {
            write!(out, "{}", self.options.prompt)?;
            out.flush()?;

            let line = match lines.next() {
                Some(line) => line?,
                None => {
                    writeln!(out)?;
                    self.execute(Command::Quit, out)?;
                    return Ok(());
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(AppError::UnknownCommand(keyword)) => {
                    tracing::debug!("Unknown command '{}'", keyword);
                    write_usage(out)?;
                    continue;
                }
                Err(e) => {
                    writeln!(out, "ERROR: {}", e)?;
                    continue;
                }
            };

            match self.execute(command, out) {
                Ok(Flow::Quit) => return Ok(()),
                Ok(Flow::Continue) => {}
                Err(AppError::Rib(e)) => {
                    writeln!(out, "COMMAND ERROR: {} ({})", e.code(), e.user_message())?
                }
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(e) => writeln!(out, "ERROR: {}", e)?,
            }
        }
    }

    fn dump<W: Write>(&self, out: &mut W) -> AppResult<()> {
        let rib = self.rib.get()?;
        match self.options.dump_format {
            DumpFormat::Table => {
                writeln!(out, "{}", DUMP_HEADER)?;
                for route in rib.routes() {
                    writeln!(out, "{}", render_route(route))?;
                }
            }
            DumpFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(rib.routes())?)?;
            }
        }
        Ok(())
    }

    /// Discard the in-memory table and reload it from the file. On failure
    /// the session is left without a table until the next successful rollback.
    fn rollback(&mut self) -> AppResult<()> {
        if self.rib.free().is_err() {
            tracing::debug!("Rollback on an unloaded table");
        }

        let mut rib = Rib::new();
        let count = table_file::load(&self.table_file, &mut rib)?;
        self.rib.replace(rib);
        tracing::info!("Rolled back to {} route(s)", count);
        Ok(())
    }

    fn close(&mut self) -> AppResult<()> {
        if self.options.commit_on_quit {
            match self.rib.get() {
                Ok(rib) => table_file::save(&self.table_file, rib)?,
                Err(_) => tracing::warn!("No table loaded, nothing committed"),
            }
        }
        if self.rib.is_initialized() {
            self.rib.free()?;
        }
        Ok(())
    }
}

/// Tab-separated row for one route
pub fn render_route(route: &Route) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        route.destination, route.netmask, route.gateway, route.iface, route.metric
    )
}

fn write_usage<W: Write>(out: &mut W) -> AppResult<()> {
    writeln!(out, "router <routingTableFile>")?;
    for line in USAGE {
        writeln!(out, "\t{}", line)?;
    }
    writeln!(out)?;
    Ok(())
}
