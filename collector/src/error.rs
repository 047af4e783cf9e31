use crate::{
    collectors::AccessDenial,
    metrics::ApiSource,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;
use strum::Display;

/// Classification of a failed API call, fixed at the point where the HTTP status is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ApiErrorKind {
    #[strum(to_string = "bad request")]
    BadRequest,
    #[strum(to_string = "unauthorized")]
    Unauthorized,
    #[strum(to_string = "forbidden")]
    Forbidden,
    #[strum(to_string = "not found")]
    NotFound,
    #[strum(to_string = "rate limited")]
    RateLimited,
    #[strum(to_string = "server error")]
    Server,
    #[strum(to_string = "unexpected status")]
    Unexpected,
    #[strum(to_string = "request failed")]
    Transport,
    #[strum(to_string = "invalid response")]
    Decode,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::BadRequest,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            429 => ApiErrorKind::RateLimited,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Unexpected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({status}): {}", self.kind, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ApiError {}

/// Error body returned by the Kontent.ai APIs.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl ApiError {
    /// Builds the error for a non-success response. The message is taken from the JSON error body if there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorBody>(body) {
            Ok(body) => body.message,
            Err(_) if body.trim().is_empty() => reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("no response body")
                .to_string(),
            Err(_) => body.trim().chars().take(200).collect(),
        };
        Self {
            kind: ApiErrorKind::from_status(status),
            status: Some(status),
            message,
        }
    }

    pub fn transport(error: reqwest::Error) -> Self {
        Self {
            kind: ApiErrorKind::Transport,
            status: None,
            message: error.to_string(),
        }
    }

    pub fn decode(error: serde_json::Error) -> Self {
        Self {
            kind: ApiErrorKind::Decode,
            status: None,
            message: error.to_string(),
        }
    }

    /// True if the API answered at all, i.e. the error carries an HTTP status.
    pub fn is_http_status(&self) -> bool {
        self.status.is_some()
    }

    /// User-facing message for a failed Subscription API call.
    pub fn subscription_message(&self) -> String {
        match self.kind {
            ApiErrorKind::BadRequest => {
                "Invalid Subscription ID. Please verify your Subscription ID and try again.".to_string()
            }
            ApiErrorKind::Unauthorized => "Invalid Subscription API key. Please verify your key and try again.".to_string(),
            ApiErrorKind::Forbidden => {
                "Insufficient permissions. Please verify your API key permissions and try again.".to_string()
            }
            ApiErrorKind::NotFound => {
                "Subscription not found. Please verify your Subscription ID and try again.".to_string()
            }
            _ => match self.status {
                Some(status) => format!("Subscription API error {status}: {}", self.message),
                None => format!("Subscription API could not be reached: {}", self.message),
            },
        }
    }

    /// User-facing message for a failed Management API key check.
    pub fn management_key_message(&self) -> String {
        if self.is_http_status() {
            "Invalid Management API key. Please verify your key and try again.".to_string()
        } else {
            format!("Management API could not be reached: {}", self.message)
        }
    }
}

/// Failure of one source of an environment. Contained by the aggregator, never fails the environment.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("{0}")]
    Access(#[from] AccessDenial),
    #[error("Failed to collect {api} data: {error}")]
    Api { api: ApiSource, error: ApiError },
}

/// Unexpected failure that prevents collecting an environment at all.
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("Endpoint '{0}' cannot be used as a base URL")]
    Endpoint(url::Url),
}

/// Error half of [`ApiResponse`], also used as the error of the key checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub message: String,
}

impl ApiFailure {
    pub fn new(status: Option<u16>, message: impl ToString) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl From<AccessDenial> for ApiFailure {
    fn from(denial: AccessDenial) -> Self {
        Self::new(None, denial)
    }
}

impl From<CollectionError> for ApiFailure {
    fn from(error: CollectionError) -> Self {
        Self::new(None, error)
    }
}

/// Serializable result envelope handed to consumers of the collection entry points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiFailure>,
}

impl<T, E> From<Result<T, E>> for ApiResponse<T>
where
    E: Into<ApiFailure>,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                success: false,
                data: None,
                error: Some(error.into()),
            },
        }
    }
}
