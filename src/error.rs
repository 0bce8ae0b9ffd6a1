use thiserror::Error;

use crate::types::{Axis, Orientation};

/// G-meter error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GMeterError {
    #[error("Incomplete sample: axis {axis} missing")]
    IncompleteSample { axis: Axis },

    #[error("Non-finite sample: axis {axis} is NaN or infinite")]
    NonFiniteSample { axis: Axis },

    #[error("Orientation {0} not supported for measurement, rotate to landscape")]
    UnsupportedOrientation(Orientation),

    #[error("Malformed input event: {0}")]
    MalformedEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config I/O error: {0}")]
    ConfigIo(String),
}

impl GMeterError {
    /// Errors that only drop the current sample
    pub fn is_sample_scoped(&self) -> bool {
        matches!(
            self,
            GMeterError::IncompleteSample { .. }
                | GMeterError::NonFiniteSample { .. }
                | GMeterError::UnsupportedOrientation(_)
        )
    }
}

/// Result type for pipeline operations
pub type GResult<T> = Result<T, GMeterError>;
