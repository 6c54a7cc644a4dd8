use std::pin::pin;

use futures::{stream, StreamExt, TryStreamExt};
use log::{info, warn};

use super::audiences::{resolve_audiences, AudienceDefinition};
use super::client::{AudienceList, MailchimpClient};
use super::normalize::normalize;
use crate::auth::Credentials;
use crate::error::{MailLensError, Result};
use crate::models::{CampaignMetrics, DateRange};

const PAGE_SIZE: u64 = 100;
const CONCURRENCY: usize = 4;
/// Upper bound on reports read per fetch, regardless of `total_items`.
const MAX_REPORTS: u64 = 10_000;

pub struct MailchimpProvider {
    pub client: MailchimpClient,
    pub account: String,
}

impl MailchimpProvider {
    pub fn new(api_base: &str, credentials: Credentials) -> Result<Self> {
        let client = MailchimpClient::new(api_base, credentials.api_key)?;

        Ok(Self {
            client,
            account: credentials.account,
        })
    }

    /// Normalized campaigns sent within `range` (inclusive), newest first.
    ///
    /// Uses the `/reports` collection so one query yields every campaign's
    /// stats. Pages after the first are fetched concurrently, and any failed
    /// page fails the whole call. Paging stops at the first short page or
    /// after `MAX_REPORTS`.
    pub async fn fetch_campaigns(
        &self,
        range: &DateRange,
        list_id: Option<&str>,
    ) -> Result<Vec<CampaignMetrics>> {
        if let Some(list_id) = list_id {
            validate_list_id(list_id)?;
        }

        info!(
            "Fetching reports for account {} from {} to {}",
            self.account,
            range.start(),
            range.end()
        );

        let first = self
            .client
            .fetch_report_page(range, list_id, 0, PAGE_SIZE)
            .await?;

        let total = first.total_items.unwrap_or(first.reports.len() as u64);
        let first_full = first.reports.len() as u64 == PAGE_SIZE;
        let mut pages = vec![first];

        if first_full && total > PAGE_SIZE {
            if total > MAX_REPORTS {
                warn!("Upstream reports {total} items, reading at most {MAX_REPORTS}");
            }
            info!("{total} reports available, fetching remaining pages...");

            #[allow(clippy::cast_possible_truncation)]
            let offsets = (PAGE_SIZE..total.min(MAX_REPORTS)).step_by(PAGE_SIZE as usize);
            let mut rest = pin!(stream::iter(offsets)
                .map(|offset| {
                    self.client
                        .fetch_report_page(range, list_id, offset, PAGE_SIZE)
                })
                .buffered(CONCURRENCY));

            // A short page is the last one, whatever total_items claimed
            while let Some(page) = rest.try_next().await? {
                let short = (page.reports.len() as u64) < PAGE_SIZE;
                pages.push(page);
                if short {
                    break;
                }
            }
        }

        let fetched: Vec<CampaignMetrics> = pages
            .into_iter()
            .flat_map(|page| page.reports)
            .map(|report| normalize(&report))
            .collect();
        let fetched_count = fetched.len();

        let mut campaigns: Vec<CampaignMetrics> = fetched
            .into_iter()
            .filter(|campaign| range.contains(campaign.send_time))
            .collect();
        campaigns.sort_by(|a, b| b.send_time.cmp(&a.send_time));

        if campaigns.len() < fetched_count {
            warn!(
                "Dropped {} reports sent outside the requested window",
                fetched_count - campaigns.len()
            );
        }
        info!(
            "Returning {} campaigns for account {}",
            campaigns.len(),
            self.account
        );

        Ok(campaigns)
    }

    pub async fn fetch_lists(&self) -> Result<Vec<AudienceList>> {
        let mut all_lists = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.client.fetch_list_page(offset, PAGE_SIZE).await?;
            let fetched_count = page.lists.len() as u64;
            all_lists.extend(page.lists);

            let total = page.total_items.unwrap_or(all_lists.len() as u64);
            if fetched_count == 0 || all_lists.len() as u64 >= total {
                break;
            }

            offset += fetched_count;
        }

        info!(
            "Found {} audience lists for account {}",
            all_lists.len(),
            self.account
        );
        Ok(all_lists)
    }

    /// Find the list whose name contains `name`, case-insensitively.
    pub async fn resolve_audience(&self, name: &str) -> Result<AudienceList> {
        let lists = self.fetch_lists().await?;
        let definition = AudienceDefinition::new(name, name);

        resolve_audiences(&lists, std::slice::from_ref(&definition))
            .shift_remove(name)
            .ok_or_else(|| {
                MailLensError::Validation(format!(
                    "No audience list matching '{name}' in account {}",
                    self.account
                ))
            })
    }
}

/// Mailchimp list ids are short alphanumeric tokens.
pub fn validate_list_id(list_id: &str) -> Result<()> {
    if list_id.is_empty() || !list_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MailLensError::Validation(format!(
            "Invalid list id '{list_id}'"
        )));
    }
    Ok(())
}
