use std::env;
use std::path::PathBuf;

use crate::{Error, LoginError, Result};

/// Environment variables the access-management scripts export before
/// constructing a client.
pub static USERNAME_ENV: &str = "tvusername";
pub static PASSWORD_ENV: &str = "tvpassword";
pub static SESSION_FILE_ENV: &str = "TV_SESSION_FILE";

static DEFAULT_SESSION_FILE: &str = "session.json";

/// Explicit client configuration. The client never reads the process
/// environment itself; callers build a `Config` (usually via
/// [`Config::from_env`]) and hand it to [`crate::TradingView::new`].
#[derive(Debug, Clone)]
pub struct Config {
    pub username: String,
    pub password: String,
    pub session_file: PathBuf,
}

#[bon::bon]
impl Config {
    #[builder]
    pub fn new<S: Into<String>>(
        username: S,
        password: S,
        session_file: Option<PathBuf>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            session_file: session_file.unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
        }
    }

    /// Reads `tvusername`/`tvpassword` (and optionally `TV_SESSION_FILE`)
    /// from the environment.
    pub fn from_env() -> Result<Self> {
        let username =
            env::var(USERNAME_ENV).map_err(|_| Error::MissingEnvVar(USERNAME_ENV.to_owned()))?;
        let password =
            env::var(PASSWORD_ENV).map_err(|_| Error::MissingEnvVar(PASSWORD_ENV.to_owned()))?;
        let session_file = env::var(SESSION_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE));

        Ok(Self {
            username,
            password,
            session_file,
        })
    }

    pub(crate) fn check(&self) -> std::result::Result<(), LoginError> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(LoginError::EmptyCredentials);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_session_file() {
        let config = Config::builder()
            .username("someone")
            .password("hunter2")
            .build();
        assert_eq!(config.session_file, PathBuf::from("session.json"));
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let config = Config::builder().username("someone").password("").build();
        assert!(matches!(config.check(), Err(LoginError::EmptyCredentials)));
    }
}
