// Date / date-time values as they travel on the wire (ISO-8601 strings)
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A calendar point in time: either a whole day or an instant with an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid ISO-8601 date or date-time `{0}`")]
pub struct InvalidEventTime(pub String);

impl EventTime {
    pub fn date(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self::Date)
    }

    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Milliseconds since the unix epoch. Date-only values count from midnight UTC.
    pub fn timestamp_millis(&self) -> i64 {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN).and_utc().timestamp_millis(),
            Self::DateTime(dt) => dt.timestamp_millis(),
        }
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN).and_utc(),
            Self::DateTime(dt) => dt.with_timezone(&Utc),
        }
    }

    pub fn naive_date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::DateTime(dt) => dt.date_naive(),
        }
    }
}

impl From<NaiveDate> for EventTime {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value.fixed_offset())
    }
}

impl FromStr for EventTime {
    type Err = InvalidEventTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Ok(Self::Date(date));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::DateTime(dt));
        }
        // No offset: read as UTC
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(Self::DateTime(naive.and_utc().fixed_offset()));
        }
        Err(InvalidEventTime(s.to_string()))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
