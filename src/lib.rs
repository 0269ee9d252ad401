//! Routing information base: an in-memory IP route table with exact lookup
//! and longest-prefix-match next-hop resolution, plus the flat-file and
//! shell collaborators used by the `router` binary.

pub mod config;
pub mod error;
pub mod rib;
pub mod shell;

pub use error::{AppError, AppResult, RibError, RibResult};
pub use rib::iputils::IpVersion;
pub use rib::{Rib, RibHandle, Route};
