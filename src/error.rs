use thiserror::Error;

/// Failures at the metadata API boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApiError {
    #[error("TMDB API key is missing; set TMDB_API_KEY or run `reelscout config --api-key <key>`")]
    MissingCredential,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP error: {status}")]
    Status { status: u16 },

    #[error("API key rejected by the server")]
    Unauthorized,

    #[error("rate limited by the server")]
    RateLimited,

    #[error("resource not found")]
    NotFound,

    #[error("failed to parse response at `{path}`: {message}")]
    Parse { path: String, message: String },

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub(crate) fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

/// Failures raised by the paginated view controllers.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ControllerError {
    #[error("no more results")]
    NoMoreResults,

    #[error("a request is already in flight")]
    RequestInFlight,

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine a configuration directory")]
    NoConfigDir,

    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("unknown route: {0}")]
    Unknown(String),

    #[error("invalid id in route: {0}")]
    InvalidId(String),
}

/// Anything the command-line front end can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error(transparent)]
    Route(#[from] RouteError),
}
