use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating a [crate::config::RideConfig].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors a destination suggestion provider may report. Callers of
/// [crate::suggest::DestinationSuggester] never see these.
#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("suggestion provider unavailable: {0}")]
    Unavailable(String),

    #[error("suggestion provider returned an unusable response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ConfigError::Invalid {
            field: "move_tick_ms",
            reason: "must be positive".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value `move_tick_ms`: must be positive"
        );

        let err = SuggestionError::Unavailable("timeout".into());
        assert!(err.to_string().contains("timeout"));
    }
}
