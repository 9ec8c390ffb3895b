//! Logging utilities.
//!
//! Logger initialization plus the session's debug level, which decides how
//! much of the error and selection protocol is echoed to the `log` facade.

mod init;
mod level;

pub use init::{init_logging, LoggingConfig};
pub use level::DebugLevel;
