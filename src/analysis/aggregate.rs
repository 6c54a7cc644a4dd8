use serde::{Deserialize, Serialize};

use crate::models::{ratio, CampaignMetrics};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub campaign_count: usize,
    pub total_sent: u64,
    pub total_opens: u64,
    pub total_unique_opens: u64,
    pub total_clicks: u64,
    pub total_unique_clicks: u64,
    pub total_unsubscribed: u64,
    pub total_abuse_reports: u64,
    pub total_forwards: u64,
    pub avg_open_rate: f64,
    pub avg_click_rate: f64,
}

/// Sum a campaign set. Rates are weighted by volume: summed uniques over
/// summed sends, so small campaigns do not skew the average. Counters
/// saturate at `u64::MAX`.
pub fn aggregate(campaigns: &[CampaignMetrics]) -> AggregateTotals {
    let mut totals = campaigns
        .iter()
        .fold(AggregateTotals::default(), |mut acc, campaign| {
            add(&mut acc.total_sent, campaign.emails_sent);
            add(&mut acc.total_opens, campaign.opens.total_opens);
            add(&mut acc.total_unique_opens, campaign.opens.unique_opens);
            add(&mut acc.total_clicks, campaign.clicks.total_clicks);
            add(&mut acc.total_unique_clicks, campaign.clicks.unique_clicks);
            add(&mut acc.total_unsubscribed, campaign.unsubscribed);
            add(&mut acc.total_abuse_reports, campaign.abuse_reports);
            add(&mut acc.total_forwards, campaign.forwards);
            acc
        });

    totals.campaign_count = campaigns.len();
    totals.avg_open_rate = ratio(totals.total_unique_opens, totals.total_sent);
    totals.avg_click_rate = ratio(totals.total_unique_clicks, totals.total_sent);
    totals
}

fn add(total: &mut u64, value: u64) {
    *total = total.saturating_add(value);
}
