use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MailLensError, Result};

pub const UNTITLED: &str = "Untitled";

/// Canonical per-campaign report. Every numeric field is present and
/// non-negative; rates are fractions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    pub id: String,
    pub send_time: DateTime<Utc>,
    pub title: String,
    pub emails_sent: u64,
    pub opens: OpenStats,
    pub clicks: ClickStats,
    pub unsubscribed: u64,
    pub abuse_reports: u64,
    pub forwards: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenStats {
    pub total_opens: u64,
    pub unique_opens: u64,
    pub open_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClickStats {
    pub total_clicks: u64,
    pub unique_clicks: u64,
    pub click_rate: f64,
}

impl CampaignMetrics {
    /// Unique opens over emails sent, 0 when nothing was sent.
    pub fn unique_open_rate(&self) -> f64 {
        ratio(self.opens.unique_opens, self.emails_sent)
    }
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let rate = numerator as f64 / denominator as f64;
    rate
}

/// Inclusive send-time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RangeBounds")]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RangeBounds {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RangeBounds> for DateRange {
    type Error = MailLensError;

    fn try_from(bounds: RangeBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(MailLensError::Validation(format!(
                "Date range start {start} is after end {end}"
            )));
        }

        Ok(Self { start, end })
    }

    /// From the start of `first` through the last second of `last`.
    pub fn from_dates(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last.and_time(NaiveTime::MIN).and_utc() + Duration::days(1)
            - Duration::seconds(1);
        Self::new(start, end)
    }

    /// Trailing window of `days` days ending at `now`.
    pub fn trailing_days(days: u32, now: DateTime<Utc>) -> Result<Self> {
        Self::new(now - Duration::days(i64::from(days)), now)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start <= time && time <= self.end
    }
}
