//! Pipeline configuration.

use crate::errors::ConfigError;
use crate::observability::{DiagnosticSink, TracingSink};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration resolved once when a pipeline is created.
///
/// Every instance derived from that pipeline shares the same configuration;
/// pipelines only hand it out by reference.
#[derive(Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Wrap step errors in a `HistoryAwareError` carrying the step history.
    #[serde(default = "default_use_decorated_error", alias = "useDecoratedError")]
    pub use_decorated_error: bool,

    /// Where `log()` diagnostic lines go.
    #[serde(skip, default = "default_sink")]
    sink: Arc<dyn DiagnosticSink>,
}

fn default_use_decorated_error() -> bool {
    true
}

fn default_sink() -> Arc<dyn DiagnosticSink> {
    Arc::new(TracingSink::default())
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            use_decorated_error: default_use_decorated_error(),
            sink: default_sink(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables error decoration.
    #[must_use]
    pub fn with_decorated_error(mut self, enabled: bool) -> Self {
        self.use_decorated_error = enabled;
        self
    }

    /// Sets the diagnostic sink used by `log()`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the diagnostic sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn DiagnosticSink> {
        &self.sink
    }

    /// Parses a configuration from JSON.
    ///
    /// Missing fields take their defaults; the sink always defaults to
    /// [`TracingSink`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not a valid
    /// configuration object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("use_decorated_error", &self.use_decorated_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::CollectingSink;

    #[test]
    fn test_default_enables_decoration() {
        assert!(PipelineConfig::default().use_decorated_error);
        assert!(PipelineConfig::new().use_decorated_error);
    }

    #[test]
    fn test_builder() {
        let sink = Arc::new(CollectingSink::new());
        let config = PipelineConfig::new()
            .with_decorated_error(false)
            .with_sink(sink.clone());

        assert!(!config.use_decorated_error);
        let expected: Arc<dyn DiagnosticSink> = sink;
        assert!(Arc::ptr_eq(config.sink(), &expected));
    }

    #[test]
    fn test_from_json_defaults() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert!(config.use_decorated_error);
    }

    #[test]
    fn test_from_json_accepts_both_spellings() {
        let snake = PipelineConfig::from_json(r#"{"use_decorated_error": false}"#).unwrap();
        let camel = PipelineConfig::from_json(r#"{"useDecoratedError": false}"#).unwrap();
        assert!(!snake.use_decorated_error);
        assert!(!camel.use_decorated_error);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = PipelineConfig::from_json(r#"{"use_decorated_error": "yes"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Invalid pipeline configuration"));
    }

    #[test]
    fn test_serializes_without_sink() {
        let json = serde_json::to_value(PipelineConfig::new()).unwrap();
        assert_eq!(json, serde_json::json!({ "use_decorated_error": true }));
    }
}
