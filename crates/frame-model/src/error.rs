//! Frame model errors.

use sphereframe_common::SphereError;

/// Errors raised while building or validating frame-model values.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid frame dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Unsupported bit depth {bit_depth} (expected 1..=16)")]
    UnsupportedBitDepth { bit_depth: u8 },

    #[error("Plane {plane} holds {got} samples, expected {expected}")]
    PlaneLength {
        plane: usize,
        expected: usize,
        got: usize,
    },

    #[error("Frame description mismatch: {message}")]
    DescMismatch { message: String },

    #[error("Unknown pixel format: {value}")]
    UnknownFormat { value: String },

    #[error("Malformed face packing: {message}")]
    MalformedPacking { message: String },
}

/// Result type alias using FrameError.
pub type FrameResult<T> = Result<T, FrameError>;

impl FrameError {
    pub fn malformed_packing(msg: impl Into<String>) -> Self {
        Self::MalformedPacking {
            message: msg.into(),
        }
    }
}

impl From<FrameError> for SphereError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::MalformedPacking { message } => SphereError::Packing { message },
            other => SphereError::Configuration {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packing_errors_map_to_packing_class() {
        let err: SphereError = FrameError::malformed_packing("token 3").into();
        assert!(matches!(err, SphereError::Packing { .. }));
    }

    #[test]
    fn geometry_errors_map_to_configuration() {
        let err: SphereError = FrameError::InvalidDimensions {
            width: 0,
            height: 4,
        }
        .into();
        assert!(matches!(err, SphereError::Configuration { .. }));
        assert!(err.to_string().contains("0x4"));
    }
}
