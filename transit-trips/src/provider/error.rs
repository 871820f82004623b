//! Provider error types.

use crate::domain::DomainError;

use super::Capability;

/// Errors surfaced by a provider.
///
/// Unknown or ambiguous locations are not errors; they come back as result
/// statuses.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network or transport failure, surfaced as-is and never retried
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Backend response did not have the expected shape
    #[error("unexpected response from {context}: {message}{}", body_suffix(.body))]
    Format {
        context: String,
        message: String,
        body: Option<String>,
    },

    /// Backend returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Local fixture or configuration file could not be read
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid credentials
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Rate limited by the backend
    #[error("rate limited by backend")]
    RateLimited,

    /// A pagination context this provider cannot continue from
    #[error("invalid pagination context: {0}")]
    InvalidContext(String),

    /// The provider does not implement this operation
    #[error("operation not supported: {0:?}")]
    Unsupported(Capability),

    /// Backend data violated a model invariant
    #[error(transparent)]
    Domain(#[from] DomainError),
}

fn body_suffix(body: &Option<String>) -> String {
    match body {
        Some(body) => format!(" (body: {body})"),
        None => String::new(),
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err)
    }
}

/// Maximum number of body characters kept in a format error.
pub(crate) const BODY_EXCERPT_CHARS: usize = 500;

impl ProviderError {
    /// Wrap a parse failure with where it happened and a body excerpt.
    pub fn format(
        context: impl Into<String>,
        message: impl ToString,
        body: Option<&str>,
    ) -> Self {
        ProviderError::Format {
            context: context.into(),
            message: message.to_string(),
            body: body.map(|b| b.chars().take(BODY_EXCERPT_CHARS).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProviderError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = ProviderError::format("trips", "expected array", Some("{}"));
        assert_eq!(
            err.to_string(),
            "unexpected response from trips: expected array (body: {})"
        );

        let err = ProviderError::format("trips", "expected array", None);
        assert_eq!(err.to_string(), "unexpected response from trips: expected array");

        let err = ProviderError::Unsupported(Capability::TripDetails);
        assert_eq!(err.to_string(), "operation not supported: TripDetails");
    }

    #[test]
    fn io_error_names_the_file() {
        let err = ProviderError::Io {
            path: "fixtures/vbb.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(err.to_string(), "failed to read \"fixtures/vbb.json\": no such file");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn format_truncates_body() {
        let body = "x".repeat(2000);
        let ProviderError::Format { body, .. } = ProviderError::format("suggest", "eof", Some(&body))
        else {
            panic!("expected format error");
        };
        assert_eq!(body.map(|b| b.len()), Some(BODY_EXCERPT_CHARS));
    }

    #[test]
    fn domain_errors_convert() {
        let err: ProviderError = DomainError::EmptyTrip.into();
        assert_eq!(err.to_string(), "trip must have at least one leg");
    }
}
