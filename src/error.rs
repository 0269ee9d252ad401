// Error types for the routing information base and its collaborators

use thiserror::Error;

/// Failure kinds reported by RIB store and matcher operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RibError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("No matching route for {0}")]
    NoMatch(String),

    #[error("Duplicate record {destination}/{netmask}")]
    DuplicateRecord { destination: String, netmask: String },

    #[error("No record {destination}/{netmask}")]
    NotExists { destination: String, netmask: String },

    #[error("Routing table is not initialized")]
    Uninitialized,
}

/// Result type alias using RibError
pub type RibResult<T> = Result<T, RibError>;

impl RibError {
    pub fn duplicate_record(destination: impl Into<String>, netmask: impl Into<String>) -> Self {
        RibError::DuplicateRecord {
            destination: destination.into(),
            netmask: netmask.into(),
        }
    }

    pub fn not_exists(destination: impl Into<String>, netmask: impl Into<String>) -> Self {
        RibError::NotExists {
            destination: destination.into(),
            netmask: netmask.into(),
        }
    }

    /// Numeric code printed by the shell; 6 stays reserved for allocation failure
    pub fn code(&self) -> u8 {
        match self {
            RibError::InvalidAddress(_) => 1,
            RibError::NoMatch(_) => 2,
            RibError::DuplicateRecord { .. } => 3,
            RibError::NotExists { .. } => 4,
            RibError::Uninitialized => 5,
        }
    }

    /// Convert error to user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            RibError::InvalidAddress(addr) => {
                format!("'{}' is not a valid address for this route.", addr)
            }
            RibError::NoMatch(dest) => format!("No route found for {}.", dest),
            RibError::DuplicateRecord { destination, netmask } => {
                format!("A route for {} {} already exists.", destination, netmask)
            }
            RibError::NotExists { destination, netmask } => {
                format!("There is no route for {} {}.", destination, netmask)
            }
            RibError::Uninitialized => {
                "Routing table is not loaded. Use ROLLBACK to reload it.".to_string()
            }
        }
    }
}

/// Errors raised by the table file, shell and configuration layers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Routing table file, line {line}: {reason}")]
    TableFile { line: usize, reason: String },

    #[error(transparent)]
    Rib(#[from] RibError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn table_file(line: usize, reason: impl Into<String>) -> Self {
        AppError::TableFile {
            line,
            reason: reason.into(),
        }
    }

    /// Line of the table file this error points at, if any
    pub fn line(&self) -> Option<usize> {
        match self {
            AppError::TableFile { line, .. } => Some(*line),
            _ => None,
        }
    }
}
