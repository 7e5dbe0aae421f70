//! CLI Exit Code Registry
//!
//! Single source of truth for `pflow` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args)                           |
//! | 3    | Config file unreadable or invalid                |
//! | 4    | Dataset CSV unreadable                           |
//! | 5    | Output could not be written                      |
//! | 6    | Flow anomalies found with `--fail-on-anomaly`    |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// Config could not be read, parsed or validated.
pub const EXIT_CONFIG_INVALID: u8 = 3;

/// A dataset CSV could not be read or parsed.
pub const EXIT_INPUT: u8 = 4;

/// Writing the reconciled CSV, flow JSON or report failed.
pub const EXIT_OUTPUT: u8 = 5;

/// The flow graph clamped at least one negative flow and the caller asked
/// for that to fail the run.
pub const EXIT_ANOMALIES: u8 = 6;
