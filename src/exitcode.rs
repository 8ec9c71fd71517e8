//! Standard exit codes (BSD sysexits.h compatible)

/// Build finished with a result other than SUCCESS
pub const BUILD_UNSUCCESSFUL: i32 = 1;

/// Queue item was cancelled before the build started
pub const CANCELLED: i32 = 3;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Service unavailable
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Can't create output file
pub const CANTCREAT: i32 = 73;

/// Input/output error
pub const IOERR: i32 = 74;

/// Temporary failure; retry may succeed
pub const TEMPFAIL: i32 = 75;

/// Permission denied
pub const NOPERM: i32 = 77;

/// Configuration error
pub const CONFIG: i32 = 78;

/// Terminated by Ctrl-C (128 + SIGINT)
pub const INTERRUPTED: i32 = 130;
