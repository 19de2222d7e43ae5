//! Exit codes for the CLI.
//!
//! Scripts can tell failures worth retrying (network) from failures that
//! need a different invocation (usage, unsupported).

/// Successful execution
pub const SUCCESS: u8 = 0;

/// General/unspecified error
pub const GENERAL_ERROR: u8 = 1;

/// Command-line usage error (bad arguments, filter, format or config file)
pub const USAGE_ERROR: u8 = 2;

/// Library website unreachable, timed out or answered with an error status
pub const NETWORK_ERROR: u8 = 3;

/// Scraped or cached metadata table has an unexpected shape
pub const DATA_ERROR: u8 = 4;

/// Instance or file not found
pub const NOT_FOUND: u8 = 5;

/// Library is known but not supported yet
pub const UNSUPPORTED: u8 = 6;
