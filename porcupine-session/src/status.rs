/// Engine status translation
///
/// Maps `pv_status_t` result codes onto the crate's error taxonomy.
/// Success is carried as `Ok`, so `EngineStatus` only names failures.

use crate::error::SpotterError;
use std::fmt;
use tracing::warn;

pub const PV_STATUS_SUCCESS: i32 = 0;
pub const PV_STATUS_OUT_OF_MEMORY: i32 = 1;
pub const PV_STATUS_IO_ERROR: i32 = 2;
pub const PV_STATUS_INVALID_ARGUMENT: i32 = 3;

/// Non-success status reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    OutOfMemory,
    IoError,
    InvalidArgument,
    Unknown(i32),
}

impl EngineStatus {
    /// Convert a raw status code, `Ok(())` for success
    pub fn check(code: i32) -> Result<(), EngineStatus> {
        match code {
            PV_STATUS_SUCCESS => Ok(()),
            PV_STATUS_OUT_OF_MEMORY => Err(EngineStatus::OutOfMemory),
            PV_STATUS_IO_ERROR => Err(EngineStatus::IoError),
            PV_STATUS_INVALID_ARGUMENT => Err(EngineStatus::InvalidArgument),
            other => Err(EngineStatus::Unknown(other)),
        }
    }

    /// Raw code as the engine reported it
    pub fn code(self) -> i32 {
        match self {
            EngineStatus::OutOfMemory => PV_STATUS_OUT_OF_MEMORY,
            EngineStatus::IoError => PV_STATUS_IO_ERROR,
            EngineStatus::InvalidArgument => PV_STATUS_INVALID_ARGUMENT,
            EngineStatus::Unknown(code) => code,
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineStatus::OutOfMemory => write!(f, "out of memory"),
            EngineStatus::IoError => write!(f, "IO error"),
            EngineStatus::InvalidArgument => write!(f, "invalid argument"),
            EngineStatus::Unknown(code) => write!(f, "unknown status {}", code),
        }
    }
}

impl From<EngineStatus> for SpotterError {
    fn from(status: EngineStatus) -> Self {
        match status {
            EngineStatus::OutOfMemory => SpotterError::OutOfMemory,
            EngineStatus::IoError => SpotterError::Io,
            EngineStatus::InvalidArgument => SpotterError::InvalidArgument,
            EngineStatus::Unknown(code) => SpotterError::Engine(code),
        }
    }
}

/// Pass a successful value through, or surface the mapped error
pub fn translate<T>(result: Result<T, EngineStatus>) -> Result<T, SpotterError> {
    result.map_err(|status| {
        warn!("Porcupine returned {} (code {})", status, status.code());
        SpotterError::from(status)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_code_passes() {
        assert_eq!(EngineStatus::check(PV_STATUS_SUCCESS), Ok(()));
        assert_eq!(translate(Ok::<_, EngineStatus>(7)), Ok(7));
    }

    #[test]
    fn test_known_codes() {
        assert_eq!(EngineStatus::check(1), Err(EngineStatus::OutOfMemory));
        assert_eq!(EngineStatus::check(2), Err(EngineStatus::IoError));
        assert_eq!(EngineStatus::check(3), Err(EngineStatus::InvalidArgument));
    }

    #[test]
    fn test_unknown_code_is_kept() {
        let status = EngineStatus::check(42).unwrap_err();
        assert_eq!(status, EngineStatus::Unknown(42));
        assert_eq!(status.code(), 42);
        assert_eq!(SpotterError::from(status), SpotterError::Engine(42));
    }

    #[test]
    fn test_translation_taxonomy() {
        assert_eq!(
            translate::<()>(Err(EngineStatus::OutOfMemory)),
            Err(SpotterError::OutOfMemory)
        );
        assert_eq!(translate::<()>(Err(EngineStatus::IoError)), Err(SpotterError::Io));
        assert_eq!(
            translate::<()>(Err(EngineStatus::InvalidArgument)),
            Err(SpotterError::InvalidArgument)
        );
        assert_eq!(
            translate::<()>(Err(EngineStatus::Unknown(-5))),
            Err(SpotterError::Engine(-5))
        );
    }

    #[test]
    fn test_code_round_trips_for_known_statuses() {
        for status in [
            EngineStatus::OutOfMemory,
            EngineStatus::IoError,
            EngineStatus::InvalidArgument,
        ] {
            assert_eq!(EngineStatus::check(status.code()), Err(status));
        }
    }
}
