//! Per-scope campaign cache.
//!
//! A finished fetch replaces the whole collection for its scope; nothing is
//! merged. Fetches carry a ticket naming the scope they were started for, and
//! results whose ticket no longer matches the active selection are dropped.

use std::collections::HashMap;
use std::future::Future;

use log::{debug, info, warn};

use crate::error::Result;
use crate::models::{CampaignMetrics, DateRange};

/// An (account, audience list) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Scope {
    pub account: String,
    pub list_id: Option<String>,
}

impl Scope {
    pub fn new(account: &str, list_id: Option<&str>) -> Self {
        Self {
            account: account.to_string(),
            list_id: list_id.map(str::to_string),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.list_id {
            Some(list_id) => write!(f, "account {}/list {list_id}", self.account),
            None => write!(f, "account {}", self.account),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    scope: Scope,
    generation: u64,
}

struct CachedCampaigns {
    range: DateRange,
    campaigns: Vec<CampaignMetrics>,
}

#[derive(Default)]
pub struct ScopeCache {
    entries: HashMap<Scope, CachedCampaigns>,
    active: Option<Scope>,
    generation: u64,
}

impl ScopeCache {
    /// Make `scope` the active selection. Every fetch started before this
    /// call becomes stale.
    pub fn select(&mut self, scope: Scope) {
        self.generation += 1;
        self.active = Some(scope);
    }

    pub fn active(&self) -> Option<&Scope> {
        self.active.as_ref()
    }

    pub fn begin_fetch(&self, scope: &Scope) -> FetchTicket {
        FetchTicket {
            scope: scope.clone(),
            generation: self.generation,
        }
    }

    /// Store a finished fetch. Returns false, leaving the cache untouched,
    /// when the ticket was superseded.
    pub fn complete(
        &mut self,
        ticket: FetchTicket,
        range: DateRange,
        campaigns: Vec<CampaignMetrics>,
    ) -> bool {
        let current =
            self.generation == ticket.generation && self.active.as_ref() == Some(&ticket.scope);
        if !current {
            debug!("Discarding stale fetch for {}", ticket.scope);
            return false;
        }

        self.entries
            .insert(ticket.scope, CachedCampaigns { range, campaigns });
        true
    }

    /// Cached campaigns for `scope`, only if they were fetched for `range`.
    pub fn get(&self, scope: &Scope, range: &DateRange) -> Option<&[CampaignMetrics]> {
        self.entries
            .get(scope)
            .filter(|entry| &entry.range == range)
            .map(|entry| entry.campaigns.as_slice())
    }

    /// The collection last stored for `scope`, whatever range it covers.
    pub fn latest(&self, scope: &Scope) -> Option<(&DateRange, &[CampaignMetrics])> {
        self.entries
            .get(scope)
            .map(|entry| (&entry.range, entry.campaigns.as_slice()))
    }

    /// Select `scope` and return its campaigns, fetching unless a cached
    /// collection for the same range exists and `refresh` is false. A failed
    /// fetch leaves any cached collection in place.
    pub async fn load<F, Fut>(
        &mut self,
        scope: &Scope,
        range: &DateRange,
        refresh: bool,
        fetch: F,
    ) -> Result<Vec<CampaignMetrics>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<CampaignMetrics>>>,
    {
        if self.active() != Some(scope) {
            self.select(scope.clone());
        }

        if !refresh {
            if let Some(cached) = self.get(scope, range) {
                info!("Using {} cached campaigns for {scope}", cached.len());
                return Ok(cached.to_vec());
            }
        }

        let ticket = self.begin_fetch(scope);
        let campaigns = fetch().await?;

        if !self.complete(ticket, range.clone(), campaigns.clone()) {
            warn!("Scope changed while fetching {scope}; result not cached");
        }

        Ok(campaigns)
    }
}
