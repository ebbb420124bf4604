use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An ISO-8601 timestamp as the backend sends it (`createdAt` fields).
///
/// The backend emits RFC 3339 strings, sometimes with fractional seconds and
/// sometimes without; chrono's `DateTime<Utc>` deserializer accepts both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// The current instant.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parses_fractional_seconds() {
        let ts: Timestamp = serde_json::from_str("\"2025-03-08T14:30:00.123Z\"").unwrap();
        assert_eq!(ts.0.timestamp_subsec_millis(), 123);
    }

    #[test]
    fn test_parses_whole_seconds() {
        let ts: Timestamp = serde_json::from_str("\"2025-03-08T14:30:00Z\"").unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap();
        assert_eq!(ts.0, expected);
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let ts = Timestamp(Utc.with_ymd_and_hms(2025, 3, 8, 14, 30, 0).unwrap());
        let json = serde_json::to_string(&ts).unwrap();
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }
}
