use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Months, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::Error;

lazy_static! {
    static ref DURATION_REGEX: Regex = Regex::new(r"^([0-9]+)([YMWDLymwdl])$").unwrap();
}

/// Access duration in the `7D` / `2M` / `1L` notation used by the grant
/// operations. `L` grants lifetime access and carries no length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDuration {
    Years(u32),
    Months(u32),
    Weeks(u32),
    Days(u32),
    Lifetime,
}

impl AccessDuration {
    /// New expiration when extending from `from`. `None` means the grant
    /// has no finite expiration.
    pub fn extend_from(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let extended = match *self {
            Self::Years(n) => from.checked_add_months(Months::new(n * 12)),
            Self::Months(n) => from.checked_add_months(Months::new(n)),
            Self::Weeks(n) => from.checked_add_signed(Duration::weeks(n as i64)),
            Self::Days(n) => from.checked_add_signed(Duration::days(n as i64)),
            Self::Lifetime => return None,
        };
        Some(extended.unwrap_or(DateTime::<Utc>::MAX_UTC))
    }
}

impl FromStr for AccessDuration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = DURATION_REGEX
            .captures(s)
            .ok_or_else(|| Error::InvalidDuration(s.to_owned()))?;
        let length: u32 = captures[1]
            .parse()
            .map_err(|_| Error::InvalidDuration(s.to_owned()))?;

        let duration = match captures[2].to_uppercase().as_str() {
            "Y" => Self::Years(length),
            "M" => Self::Months(length),
            "W" => Self::Weeks(length),
            "D" => Self::Days(length),
            "L" => Self::Lifetime,
            _ => return Err(Error::InvalidDuration(s.to_owned())),
        };
        Ok(duration)
    }
}

impl fmt::Display for AccessDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Years(n) => write!(f, "{n}Y"),
            Self::Months(n) => write!(f, "{n}M"),
            Self::Weeks(n) => write!(f, "{n}W"),
            Self::Days(n) => write!(f, "{n}D"),
            Self::Lifetime => write!(f, "1L"),
        }
    }
}

pub fn is_expired(expiration: DateTime<Utc>) -> bool {
    expiration < Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_all_units() {
        assert_eq!("7D".parse::<AccessDuration>().unwrap(), AccessDuration::Days(7));
        assert_eq!("2m".parse::<AccessDuration>().unwrap(), AccessDuration::Months(2));
        assert_eq!("3W".parse::<AccessDuration>().unwrap(), AccessDuration::Weeks(3));
        assert_eq!("1Y".parse::<AccessDuration>().unwrap(), AccessDuration::Years(1));
        assert_eq!("1L".parse::<AccessDuration>().unwrap(), AccessDuration::Lifetime);
    }

    #[test]
    fn rejects_malformed_durations() {
        for bad in ["", "D", "7", "7X", "D7", "7DD", "-7D"] {
            assert!(
                matches!(bad.parse::<AccessDuration>(), Err(Error::InvalidDuration(_))),
                "{bad:?} should not parse"
            );
        }
    }

    #[test]
    fn extends_calendar_aware() {
        let from = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();

        let one_month = AccessDuration::Months(1).extend_from(from).unwrap();
        // Jan 31 + 1 month clamps to the end of February.
        assert_eq!(one_month, Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap());

        let one_week = AccessDuration::Weeks(1).extend_from(from).unwrap();
        assert_eq!(one_week, from + Duration::days(7));

        let two_years = AccessDuration::Years(2).extend_from(from).unwrap();
        assert_eq!(two_years, Utc.with_ymd_and_hms(2028, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn lifetime_has_no_expiration() {
        assert_eq!(AccessDuration::Lifetime.extend_from(Utc::now()), None);
    }

    #[test]
    fn expiry_check() {
        assert!(is_expired(Utc::now() - Duration::hours(1)));
        assert!(!is_expired(Utc::now() + Duration::hours(1)));
    }
}
