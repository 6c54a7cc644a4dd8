use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::analysis::{
    aggregate, build_trend, compare, select_highlights, AggregateTotals, Benchmark,
    ComparisonResult, Granularity, Highlights, TrendPoint,
};
use crate::models::{CampaignMetrics, DateRange};
use crate::providers::mailchimp::AudienceList;

#[derive(Debug, Serialize)]
pub struct CampaignInsights {
    pub provider: String,
    pub account: String,
    pub list_id: Option<String>,
    pub collected_at: DateTime<Utc>,
    pub date_range: DateRange,
    pub totals: AggregateTotals,
    pub benchmarks: Vec<ComparisonResult>,
    pub highlights: Option<Highlights>,
    pub granularity: Granularity,
    pub trend: Vec<TrendPoint>,
    pub campaigns: Vec<CampaignMetrics>,
}

impl CampaignInsights {
    pub fn build(
        account: &str,
        list_id: Option<&str>,
        date_range: DateRange,
        campaigns: Vec<CampaignMetrics>,
        granularity: Granularity,
        benchmarks: &[Benchmark],
    ) -> Self {
        let totals = aggregate(&campaigns);

        Self {
            provider: "Mailchimp".to_string(),
            account: account.to_string(),
            list_id: list_id.map(str::to_string),
            collected_at: Utc::now(),
            date_range,
            benchmarks: compare(&totals, benchmarks),
            highlights: select_highlights(&campaigns),
            granularity,
            trend: build_trend(&campaigns, granularity),
            totals,
            campaigns,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AudienceListing {
    pub account: String,
    pub lists: Vec<AudienceList>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub resolved: IndexMap<String, AudienceList>,
}
