use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// A combined backend timestamp split into its date and time parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Schedule {
    /// Calendar day.
    pub date: NaiveDate,
    /// Wall-clock time on that day.
    pub time: NaiveTime,
}

impl Schedule {
    /// Parse `YYYY-MM-DD HH:MM[:SS]`, its `T`-separated form, RFC 3339, or the
    /// RFC 2822 style produced by JSON encoders of HTTP dates.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let naive = NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .or_else(|| {
                DateTime::parse_from_rfc3339(raw)
                    .ok()
                    .map(|value| value.naive_local())
            })
            .or_else(|| {
                DateTime::parse_from_rfc2822(raw)
                    .ok()
                    .map(|value| value.naive_local())
            })?;

        Some(Self {
            date: naive.date(),
            time: naive.time(),
        })
    }

    /// `YYYY-MM-DD`.
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    /// `HH:MM`.
    pub fn time_label(&self) -> String {
        self.time.format("%H:%M").to_string()
    }

    /// Combined form the backend expects when creating a game.
    pub fn to_backend_string(&self) -> String {
        format!("{} {}", self.date_label(), self.time_label())
    }
}
