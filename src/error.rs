//! Build errors

use thiserror::Error;

/// Errors raised while reading, validating or rendering one content file.
///
/// Every variant carries the source path of the offending file so the
/// build can halt with a message an author can act on.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{path}: malformed header block: {source}")]
    Header {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("{path}: missing required metadata field `{field}`")]
    MissingField { path: String, field: &'static str },

    #[error("{path}: invalid date {value:?}, expected YYYY-MM-DD")]
    InvalidDate { path: String, value: String },

    #[error("{path}: template expansion failed: {message}")]
    Template { path: String, message: String },

    #[error("no content item registered for {0:?}")]
    UnknownItem(String),
}

impl BuildError {
    /// Build a template error, flattening tera's error chain into one line
    pub fn template(path: &str, err: &tera::Error) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        BuildError::Template {
            path: path.to_string(),
            message,
        }
    }
}
