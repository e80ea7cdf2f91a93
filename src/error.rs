use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Generic {0}")]
    Generic(String),

    #[error("failed to send the api request")]
    RequestError(#[from] reqwest::Error),

    #[error("failed to parse the api response")]
    ParseError(#[from] serde_json::Error),

    #[error("invalid header value")]
    HeaderValueError(#[from] reqwest::header::InvalidHeaderValue),

    #[error("failed to login")]
    LoginError(#[from] LoginError),

    #[error("failed to read or write the session file")]
    IoError(#[from] std::io::Error),

    #[error("missing environment variable {}", .0)]
    MissingEnvVar(String),

    #[error("invalid access duration {}", .0)]
    InvalidDuration(String),

    #[error("Tokio task join error")]
    TokioJoinError(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("username or password is empty")]
    EmptyCredentials,

    #[error("username or password is invalid")]
    InvalidCredentials,

    #[error("no sessionid cookie in the signin response")]
    SessionNotFound,
}
