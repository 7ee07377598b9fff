//! Status codes returned by every evaluation entry point of an adapter.

use serde::{Deserialize, Serialize};

/// Outcome of an evaluation call.
///
/// Evaluations never panic and never return a `Result`: the external solver
/// reads this status and decides what to do. A recoverable error asks the
/// solver to shrink the step and retry, an unrecoverable error aborts the
/// integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Success,
    RecoverableError,
    UnrecoverableError,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }

    pub fn is_recoverable(self) -> bool {
        self == Status::RecoverableError
    }

    pub fn is_unrecoverable(self) -> bool {
        self == Status::UnrecoverableError
    }

    /// Combine two statuses, keeping the more severe one.
    pub fn and(self, other: Status) -> Status {
        match (self, other) {
            (Status::UnrecoverableError, _) | (_, Status::UnrecoverableError) => {
                Status::UnrecoverableError
            }
            (Status::RecoverableError, _) | (_, Status::RecoverableError) => {
                Status::RecoverableError
            }
            _ => Status::Success,
        }
    }

    /// Integer code following the convention of C solver engines: zero on
    /// success, positive for recoverable and negative for unrecoverable
    /// failures.
    pub fn code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::RecoverableError => 1,
            Status::UnrecoverableError => -1,
        }
    }

    pub fn from_code(code: i32) -> Status {
        match code {
            0 => Status::Success,
            c if c > 0 => Status::RecoverableError,
            _ => Status::UnrecoverableError,
        }
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::Status;

    #[test]
    fn test_and_keeps_worst() {
        assert_eq!(Status::Success.and(Status::Success), Status::Success);
        assert_eq!(
            Status::Success.and(Status::RecoverableError),
            Status::RecoverableError
        );
        assert_eq!(
            Status::UnrecoverableError.and(Status::RecoverableError),
            Status::UnrecoverableError
        );
    }

    #[test]
    fn test_codes() {
        for status in [
            Status::Success,
            Status::RecoverableError,
            Status::UnrecoverableError,
        ] {
            assert_eq!(Status::from_code(status.code()), status);
        }
        assert_eq!(Status::from_code(7), Status::RecoverableError);
        assert_eq!(Status::from_code(-3), Status::UnrecoverableError);
        assert_eq!(i32::from(Status::Success), 0);
    }
}
