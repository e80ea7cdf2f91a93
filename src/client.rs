use std::sync::Arc;

use async_trait::async_trait;
use reqwest::multipart::Form;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    Config, Error, LoginError, Result,
    models::{UsernameHint, UsernameValidation},
    session::SessionStore,
    utils::{SIGNIN_URL, TVCOINS_URL, USERNAME_HINT_URL, build_request},
};

/// Seam for harnesses that need to stub the remote validation service.
#[async_trait]
pub trait ValidateUsername {
    async fn validate_username(&self, username: &str) -> Result<UsernameValidation>;
}

/// TradingView access-management client. Cheap to clone; clones share the
/// session and its on-disk store.
#[derive(Debug, Clone)]
pub struct TradingView {
    config: Arc<Config>,
    store: SessionStore,
    session: Arc<RwLock<Option<String>>>,
}

impl TradingView {
    /// Constructs a client from an explicit configuration. Fails when the
    /// credentials are empty.
    pub fn new(config: Config) -> Result<Self> {
        let store = SessionStore::new(&config.session_file);
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: SessionStore) -> Result<Self> {
        config.check()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            session: Arc::new(RwLock::new(None)),
        })
    }

    /// Ensures a usable session: reuse the stored one when it still
    /// validates, otherwise sign in again. Idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn init(&self) -> Result<()> {
        let mut session = self.session.write().await;
        if session.is_some() {
            return Ok(());
        }

        info!("initializing TradingView client");
        if let Some(stored) = self.store.session_id().await? {
            if self.validate_session(&stored).await? {
                debug!("stored session is valid");
                *session = Some(stored);
                return Ok(());
            }
            warn!("stored session is invalid, logging in again");
        }

        *session = Some(self.login().await?);
        Ok(())
    }

    /// Signs in with the configured credentials and persists the session
    /// id extracted from the `sessionid` cookie.
    #[tracing::instrument(skip(self))]
    pub async fn login(&self) -> Result<String> {
        let client = build_request(None)?;
        let response = client
            .post(SIGNIN_URL)
            .multipart(
                Form::new()
                    .text("username", self.config.username.clone())
                    .text("password", self.config.password.clone())
                    .text("remember", "on"),
            )
            .send()
            .await?;

        let session = response
            .cookies()
            .find(|cookie| cookie.name() == "sessionid")
            .map(|cookie| cookie.value().to_owned());

        match session {
            Some(session) => {
                self.store.set_session_id(&session).await?;
                info!("login successful, session saved");
                Ok(session)
            }
            None => {
                error!("no sessionid cookie in the signin response");
                Err(Error::LoginError(LoginError::InvalidCredentials))
            }
        }
    }

    /// A session is valid when the tvcoins endpoint accepts its cookie.
    /// Transport failures count as invalid rather than erroring out, so a
    /// stale session falls through to a fresh login.
    async fn validate_session(&self, session: &str) -> Result<bool> {
        let client = build_request(Some(&format!("sessionid={session}")))?;
        match client.get(TVCOINS_URL).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!("session validation failed: {e}");
                Ok(false)
            }
        }
    }

    pub(crate) async fn session_cookie(&self) -> Result<String> {
        self.init().await?;
        let session = self.session.read().await;
        match session.as_deref() {
            Some(session) => Ok(format!("sessionid={session}")),
            None => Err(Error::LoginError(LoginError::SessionNotFound)),
        }
    }

    /// Checks whether `username` names an existing TradingView account.
    /// Matches the hint list case-insensitively and reports the exact
    /// spelling TradingView knows. Needs no session.
    #[tracing::instrument(skip(self))]
    pub async fn validate_username(&self, username: &str) -> Result<UsernameValidation> {
        let client = build_request(None)?;
        let hints: Vec<UsernameHint> = client
            .get(USERNAME_HINT_URL)
            .query(&[("s", username)])
            .send()
            .await?
            .json()
            .await?;

        let matched = hints
            .into_iter()
            .find(|hint| hint.username.eq_ignore_ascii_case(username));

        Ok(match matched {
            Some(hint) => UsernameValidation {
                valid: true,
                verified_username: hint.username,
            },
            None => UsernameValidation::default(),
        })
    }
}

#[async_trait]
impl ValidateUsername for TradingView {
    async fn validate_username(&self, username: &str) -> Result<UsernameValidation> {
        TradingView::validate_username(self, username).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::builder()
            .username("someone@example.com")
            .password("hunter2")
            .build()
    }

    #[test]
    fn construction_rejects_empty_credentials() {
        let config = Config::builder().username("").password("").build();
        let result = TradingView::new(config);
        assert!(matches!(
            result,
            Err(Error::LoginError(LoginError::EmptyCredentials))
        ));
    }

    #[test]
    fn clones_share_session_state() {
        let tv = TradingView::new(config()).unwrap();
        let clone = tv.clone();
        assert!(Arc::ptr_eq(&tv.session, &clone.session));
    }
}
