//! Exit code constants for the roadmapper CLI.
//!
//! | Code | Constant | Description |
//! |------|----------|-------------|
//! | 0 | `SUCCESS` | Operation completed successfully |
//! | 1 | `INTERNAL` | General/internal failure |
//! | 2 | `CLI_ARGS` | Invalid CLI arguments or configuration |
//! | 3 | `NOT_FOUND` | Referenced roadmap does not exist |
//! | 4 | `JOB_FAILED` | A generation job failed fatally |
//! | 5 | `INTERRUPTED` | The queue was paused before it drained |
//! | 9 | `LOCK_HELD` | Another worker holds the store lock |
//! | 70 | `PROVIDER_FAILURE` | Provider failure outside a job (construction, auth) |

/// Exit codes matching the documented exit code table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(i32);

impl ExitCode {
    /// Success - operation completed successfully
    pub const SUCCESS: ExitCode = ExitCode(0);

    /// Internal error - general failure
    pub const INTERNAL: ExitCode = ExitCode(1);

    /// CLI arguments error - invalid arguments or configuration
    pub const CLI_ARGS: ExitCode = ExitCode(2);

    /// Referenced roadmap does not exist
    pub const NOT_FOUND: ExitCode = ExitCode(3);

    /// At least one job failed fatally
    pub const JOB_FAILED: ExitCode = ExitCode(4);

    /// Queue paused before draining (Ctrl-C)
    pub const INTERRUPTED: ExitCode = ExitCode(5);

    /// Lock held - another worker process owns the store
    pub const LOCK_HELD: ExitCode = ExitCode(9);

    /// Provider could not be constructed or authenticated
    pub const PROVIDER_FAILURE: ExitCode = ExitCode(70);

    /// Get the numeric exit code value.
    ///
    /// Use this with `std::process::exit()`.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Create an ExitCode from a raw i32 value.
    #[must_use]
    pub const fn from_i32(code: i32) -> Self {
        ExitCode(code)
    }
}

impl From<i32> for ExitCode {
    fn from(code: i32) -> Self {
        ExitCode(code)
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
