use serde::{Deserialize, Serialize};

use crate::models::CampaignMetrics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub best: CampaignMetrics,
    pub worst: CampaignMetrics,
}

/// Best and worst campaign by unique open rate, in one pass.
///
/// On exact ties the first campaign encountered wins, for both ends, so the
/// result only depends on input order when rates are equal.
pub fn select_highlights(campaigns: &[CampaignMetrics]) -> Option<Highlights> {
    let (first, rest) = campaigns.split_first()?;

    let (best, worst) = rest.iter().fold((first, first), |(best, worst), campaign| {
        let rate = campaign.unique_open_rate();
        let best = if rate > best.unique_open_rate() {
            campaign
        } else {
            best
        };
        let worst = if rate < worst.unique_open_rate() {
            campaign
        } else {
            worst
        };
        (best, worst)
    });

    Some(Highlights {
        best: best.clone(),
        worst: worst.clone(),
    })
}
