use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One candidate row from the `username_hint` endpoint. The endpoint
/// returns more fields, only the username matters here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UsernameHint {
    pub username: String,
}

/// Outcome of validating a username against TradingView. Wire names match
/// what the upstream access-management API has always returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameValidation {
    #[serde(rename = "validuser")]
    pub valid: bool,
    #[serde(rename = "verifiedUserName")]
    pub verified_username: String,
}

/// Response of `pine_perm/list_users`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinePermissionList {
    #[serde(default)]
    pub results: Vec<PinePermission>,
}

/// A user currently granted access to a Pine script. A missing
/// `expiration` means the grant never expires.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PinePermission {
    pub username: String,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "Not Applied")]
    NotApplied,
    Success,
    Failure,
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotApplied => write!(f, "Not Applied"),
            Self::Success => write!(f, "Success"),
            Self::Failure => write!(f, "Failure"),
        }
    }
}

/// Access state for one `(username, pine_id)` pair, before and after a
/// grant or removal is applied.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDetails {
    pub pine_id: String,
    pub username: String,
    #[serde(rename = "hasAccess")]
    pub has_access: bool,
    #[serde(rename = "noExpiration")]
    pub no_expiration: bool,
    #[serde(rename = "currentExpiration")]
    pub current_expiration: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
    pub status: Status,
}

impl AccessDetails {
    pub fn new<S: Into<String>>(username: S, pine_id: S) -> Self {
        Self {
            pine_id: pine_id.into(),
            username: username.into(),
            has_access: false,
            no_expiration: false,
            current_expiration: Utc::now(),
            expiration: None,
            status: Status::NotApplied,
        }
    }
}

/// Aggregate outcome of a bulk sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkReport {
    pub total: usize,
    pub success: usize,
    pub errors: usize,
    #[serde(rename = "durationMs")]
    pub elapsed_ms: u64,
}

impl BulkReport {
    /// Percentage of operations that succeeded, rounded.
    pub fn success_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.success as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_wire_names() {
        let validation = UsernameValidation {
            valid: true,
            verified_username: "SomeUser".to_owned(),
        };
        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json["validuser"], true);
        assert_eq!(json["verifiedUserName"], "SomeUser");
    }

    #[test]
    fn permission_list_parses_missing_expiration() {
        let list: PinePermissionList = serde_json::from_str(
            r#"{"results":[
                {"username":"alice","expiration":"2026-03-01T00:00:00+00:00"},
                {"username":"bob"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(list.results.len(), 2);
        assert!(list.results[0].expiration.is_some());
        assert!(list.results[1].expiration.is_none());
    }

    #[test]
    fn empty_permission_list() {
        let list: PinePermissionList = serde_json::from_str("{}").unwrap();
        assert!(list.results.is_empty());
    }

    #[test]
    fn success_rate_rounds() {
        let report = BulkReport {
            total: 3,
            success: 2,
            errors: 1,
            elapsed_ms: 10,
        };
        assert_eq!(report.success_rate(), 67);
        assert_eq!(BulkReport::default().success_rate(), 0);
    }
}
