//! Error types shared across SphereFrame crates.

/// Top-level error type for SphereFrame operations.
#[derive(Debug, thiserror::Error)]
pub enum SphereError {
    /// Incompatible inputs, out-of-range parameters, or unmatched face ids.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Malformed face-packing descriptor.
    #[error("Packing error: {message}")]
    Packing { message: String },

    /// Projection geometry the transform engine cannot handle.
    #[error("Unsupported projection: {message}")]
    UnsupportedProjection { message: String },

    #[error("Processing error: {message}")]
    Processing { message: String },

    /// `process` called on a module whose `create` never succeeded.
    #[error("Module '{name}' has not been created")]
    NotCreated { name: String },

    #[error("Unknown module: {name}")]
    UnknownModule { name: String },

    #[error("Module already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Unknown option '{option}' for module '{module}'")]
    UnknownOption { module: String, option: String },

    #[error("Option '{option}' expects {expected}, got {got}")]
    OptionType {
        option: String,
        expected: String,
        got: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using SphereError.
pub type SphereResult<T> = Result<T, SphereError>;

impl SphereError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration {
            message: msg.into(),
        }
    }

    pub fn packing(msg: impl Into<String>) -> Self {
        Self::Packing {
            message: msg.into(),
        }
    }

    pub fn unsupported_projection(msg: impl Into<String>) -> Self {
        Self::UnsupportedProjection {
            message: msg.into(),
        }
    }

    pub fn processing(msg: impl Into<String>) -> Self {
        Self::Processing {
            message: msg.into(),
        }
    }

    pub fn not_created(name: impl Into<String>) -> Self {
        Self::NotCreated { name: name.into() }
    }

    /// Whether the error belongs to the configuration class raised by `create`.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration { .. }
                | Self::Packing { .. }
                | Self::UnsupportedProjection { .. }
                | Self::UnknownOption { .. }
                | Self::OptionType { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(SphereError::configuration("x")
            .to_string()
            .starts_with("Configuration error:"));
        assert!(SphereError::packing("x")
            .to_string()
            .starts_with("Packing error:"));
        assert!(SphereError::unsupported_projection("x")
            .to_string()
            .starts_with("Unsupported projection:"));
        assert!(SphereError::not_created("erp_to_square")
            .to_string()
            .contains("erp_to_square"));
    }

    #[test]
    fn configuration_class() {
        assert!(SphereError::packing("bad token").is_configuration());
        assert!(!SphereError::processing("boom").is_configuration());
        assert!(!SphereError::not_created("m").is_configuration());
    }

    #[test]
    fn other_preserves_source() {
        let err = SphereError::Other(anyhow::anyhow!("boom"));
        assert!(err.to_string().contains("boom"));
    }
}
