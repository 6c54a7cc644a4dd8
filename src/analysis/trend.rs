use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::aggregate::{aggregate, AggregateTotals};
use crate::models::CampaignMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
    Month,
}

impl Granularity {
    /// First day of the period containing `date`. Weeks start on Monday.
    fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Week => {
                date - chrono::Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period_start: NaiveDate,
    pub totals: AggregateTotals,
}

/// Bucket campaigns by send period (UTC) and aggregate each bucket.
pub fn build_trend(campaigns: &[CampaignMetrics], granularity: Granularity) -> Vec<TrendPoint> {
    let buckets = campaigns.iter().fold(
        BTreeMap::<NaiveDate, Vec<CampaignMetrics>>::new(),
        |mut acc, campaign| {
            let period = granularity.period_start(campaign.send_time.date_naive());
            acc.entry(period).or_default().push(campaign.clone());
            acc
        },
    );

    buckets
        .into_iter()
        .map(|(period_start, bucket)| TrendPoint {
            period_start,
            totals: aggregate(&bucket),
        })
        .collect()
}
