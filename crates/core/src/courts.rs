//! Browsing the open court listings and narrowing them down.

use chrono::{NaiveDate, NaiveTime};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{
    api::{ApiResult, HttpGameApi},
    models::GameId,
};

/// A court listing as returned by `GET /courts`.
///
/// Listings carry the legacy schedule shape: a date plus an
/// `HH:MM - HH:MM` range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Court {
    /// Identifier of the game held on this court; opens with `game <id>`.
    pub id: GameId,
    /// Court name.
    #[serde(default)]
    pub name: String,
    /// Venue location.
    #[serde(default)]
    pub location: String,
    /// Price per seat.
    #[serde(default)]
    pub price: Option<f64>,
    /// Seats still open.
    #[serde(default)]
    pub available_seats: Option<u32>,
    /// `YYYY-MM-DD` the court is available on.
    #[serde(default)]
    pub available_date: Option<String>,
    /// `HH:MM - HH:MM` window the court is available for.
    #[serde(default)]
    pub available_time: Option<String>,
    /// Picture of the court.
    #[serde(default)]
    pub image: Option<String>,
}

impl Court {
    /// Parsed availability date.
    pub fn date(&self) -> Option<NaiveDate> {
        let raw = self.available_date.as_deref()?.trim();
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| raw.get(..10).and_then(|day| day.parse().ok()))
    }

    /// Parsed availability window.
    pub fn window(&self) -> Option<(NaiveTime, NaiveTime)> {
        let (start, end) = self.available_time.as_deref()?.split_once('-')?;
        Some((parse_time(start)?, parse_time(end)?))
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Fetch every court listing. The endpoint is public.
pub async fn list(api: &HttpGameApi) -> ApiResult<Vec<Court>> {
    let path = "courts";
    let builder = api.request(Method::GET, path, None);
    api.fetch_json(path, builder).await
}

/// Criteria for narrowing court listings. Unset criteria match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourtFilter {
    /// Case-insensitive substring of the location.
    pub location: Option<String>,
    /// Highest acceptable price.
    pub max_price: Option<f64>,
    /// Inclusive date range.
    pub dates: Option<(NaiveDate, NaiveDate)>,
    /// Time window the court's availability has to overlap.
    pub window: Option<(NaiveTime, NaiveTime)>,
}

impl CourtFilter {
    /// Listings matching every set criterion, in their original order.
    pub fn apply<'a>(&self, courts: &'a [Court]) -> Vec<&'a Court> {
        courts.iter().filter(|court| self.matches(court)).collect()
    }

    /// Whether one listing satisfies every set criterion.
    ///
    /// A listing missing the field a criterion looks at never matches it.
    pub fn matches(&self, court: &Court) -> bool {
        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            let needle = location.trim().to_lowercase();
            if !court.location.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(max_price) = self.max_price {
            if !court.price.is_some_and(|price| price <= max_price) {
                return false;
            }
        }

        if let Some((from, to)) = self.dates {
            if !court.date().is_some_and(|date| from <= date && date <= to) {
                return false;
            }
        }

        if let Some(wanted) = self.window {
            if !court.window().is_some_and(|offered| overlaps(offered, wanted)) {
                return false;
            }
        }

        true
    }
}

/// The offered window starts inside the wanted one, ends inside it, or spans it.
fn overlaps(
    (offered_start, offered_end): (NaiveTime, NaiveTime),
    (start, end): (NaiveTime, NaiveTime),
) -> bool {
    (offered_start >= start && offered_start < end)
        || (offered_end > start && offered_end <= end)
        || (offered_start <= start && offered_end >= end)
}
