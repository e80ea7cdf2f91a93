use reqwest::multipart::Form;
use tracing::{debug, info, warn};

use crate::{
    AccessDuration, Result,
    client::TradingView,
    models::{AccessDetails, PinePermissionList, Status},
    utils::{ADD_ACCESS_URL, LIST_USERS_URL, MODIFY_ACCESS_URL, REMOVE_ACCESS_URL, build_request},
};

impl TradingView {
    /// Current access state of `username` for one Pine script.
    #[tracing::instrument(skip(self))]
    pub async fn get_access_details(&self, username: &str, pine_id: &str) -> Result<AccessDetails> {
        let cookie = self.session_cookie().await?;
        let client = build_request(Some(&cookie))?;

        let list: PinePermissionList = client
            .post(format!("{LIST_USERS_URL}?limit=10&order_by=-created"))
            .form(&[("pine_id", pine_id), ("username", username)])
            .send()
            .await?
            .json()
            .await?;

        let mut details = AccessDetails::new(username, pine_id);
        for permission in list.results {
            if permission.username.eq_ignore_ascii_case(username) {
                details.has_access = true;
                match permission.expiration {
                    Some(expiration) => details.current_expiration = expiration,
                    None => details.no_expiration = true,
                }
                break;
            }
        }

        debug!(
            has_access = details.has_access,
            no_expiration = details.no_expiration,
            "access details fetched"
        );
        Ok(details)
    }

    /// Grants or extends access for `duration`. Existing grants are
    /// extended from their current expiration, new ones from now.
    #[tracing::instrument(skip(self))]
    pub async fn grant_access(
        &self,
        username: &str,
        pine_id: &str,
        duration: AccessDuration,
    ) -> Result<AccessDetails> {
        let details = self.get_access_details(username, pine_id).await?;
        let result = self.add_access(details, duration).await?;
        info!(status = %result.status, "access granted");
        Ok(result)
    }

    pub(crate) async fn add_access(
        &self,
        mut details: AccessDetails,
        duration: AccessDuration,
    ) -> Result<AccessDetails> {
        details.expiration = Some(details.current_expiration);

        // Nothing to extend for a user who already holds a lifetime grant.
        if details.no_expiration {
            return Ok(details);
        }

        let mut form = Form::new()
            .text("pine_id", details.pine_id.clone())
            .text("username_recip", details.username.clone());

        match duration.extend_from(details.current_expiration) {
            Some(expiration) => {
                form = form.text("expiration", expiration.to_rfc3339());
                details.expiration = Some(expiration);
            }
            None => {
                // Lifetime grant: no expiration field in the payload.
                details.no_expiration = true;
                details.expiration = None;
            }
        }

        let endpoint = if details.has_access {
            MODIFY_ACCESS_URL
        } else {
            ADD_ACCESS_URL
        };

        let cookie = self.session_cookie().await?;
        let client = build_request(Some(&cookie))?;
        let response = client.post(endpoint).multipart(form).send().await?;

        let status = response.status();
        details.status = if status.is_success() {
            Status::Success
        } else {
            warn!(%status, "access grant rejected");
            Status::Failure
        };
        Ok(details)
    }

    /// Revokes access for `username` on one Pine script.
    #[tracing::instrument(skip(self))]
    pub async fn remove_access(&self, username: &str, pine_id: &str) -> Result<AccessDetails> {
        let mut details = self.get_access_details(username, pine_id).await?;

        let cookie = self.session_cookie().await?;
        let client = build_request(Some(&cookie))?;
        let response = client
            .post(REMOVE_ACCESS_URL)
            .multipart(
                Form::new()
                    .text("pine_id", details.pine_id.clone())
                    .text("username_recip", details.username.clone()),
            )
            .send()
            .await?;

        let status = response.status();
        details.status = if status.is_success() {
            Status::Success
        } else {
            warn!(%status, "access removal rejected");
            Status::Failure
        };
        info!(status = %details.status, "access removed");
        Ok(details)
    }
}
