use reqwest::header::{ACCEPT, COOKIE, HeaderMap, HeaderValue, ORIGIN, REFERER};

use crate::Result;

pub(crate) static SIGNIN_URL: &str = "https://www.tradingview.com/accounts/signin/";
pub(crate) static TVCOINS_URL: &str = "https://www.tradingview.com/tvcoins/details/";
pub(crate) static USERNAME_HINT_URL: &str = "https://www.tradingview.com/username_hint/";
pub(crate) static LIST_USERS_URL: &str = "https://www.tradingview.com/pine_perm/list_users/";
pub(crate) static ADD_ACCESS_URL: &str = "https://www.tradingview.com/pine_perm/add/";
pub(crate) static MODIFY_ACCESS_URL: &str =
    "https://www.tradingview.com/pine_perm/modify_user_expiration/";
pub(crate) static REMOVE_ACCESS_URL: &str = "https://www.tradingview.com/pine_perm/remove/";

pub(crate) fn build_request(cookie: Option<&str>) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        ORIGIN,
        HeaderValue::from_static("https://www.tradingview.com"),
    );
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.tradingview.com/"),
    );
    if let Some(cookie) = cookie {
        headers.insert(COOKIE, HeaderValue::from_str(cookie)?);
    }

    let client = reqwest::Client::builder()
        .default_headers(headers)
        .https_only(true)
        .user_agent(crate::UA)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_request_accepts_session_cookie() {
        assert!(build_request(Some("sessionid=abc123")).is_ok());
    }

    #[test]
    fn build_request_rejects_garbage_cookie() {
        assert!(build_request(Some("sessionid=\n")).is_err());
    }
}
