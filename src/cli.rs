use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use crate::analysis::{Benchmark, Granularity};
use crate::auth::Credentials;
use crate::insights::{AudienceListing, CampaignInsights};
use crate::models::{CampaignMetrics, DateRange};
use crate::providers::mailchimp::{
    resolve_audiences, validate_list_id, AudienceDefinition, MailchimpProvider,
};
use crate::session::{Scope, ScopeCache};

#[derive(Parser)]
#[command(name = "maillens")]
#[command(author, version, about = "Email Campaign Insights Tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (defaults to stdout)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Pretty print JSON output
    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect campaign insights for an account
    Report {
        /// Account number; credentials come from MAILCHIMP_API_KEY[_N]
        #[arg(long, env = "MAILLENS_ACCOUNT", default_value = "1")]
        account: String,

        /// Mailchimp API base URL (defaults to the account's data center)
        #[arg(long, env = "MAILCHIMP_API_URL")]
        api_url: Option<String>,

        /// Audience list ID to restrict reports to
        #[arg(short, long, conflicts_with = "audience")]
        list_id: Option<String>,

        /// Audience list name (case-insensitive substring)
        #[arg(short, long)]
        audience: Option<String>,

        /// First send date to include (YYYY-MM-DD)
        #[arg(long, requires = "until")]
        since: Option<NaiveDate>,

        /// Last send date to include (YYYY-MM-DD)
        #[arg(long, requires = "since")]
        until: Option<NaiveDate>,

        /// Trailing window in days, used when no explicit dates are given
        #[arg(short, long, default_value_t = 30, conflicts_with_all = ["since", "until"])]
        days: u32,

        /// Trend bucket size
        #[arg(short, long, value_enum, default_value_t = Granularity::Week)]
        granularity: Granularity,

        /// Re-fetch every N seconds until interrupted
        #[arg(short, long)]
        watch: Option<u64>,
    },
    /// List the audience lists of an account
    Lists {
        /// Account number; credentials come from MAILCHIMP_API_KEY[_N]
        #[arg(long, env = "MAILLENS_ACCOUNT", default_value = "1")]
        account: String,

        /// Mailchimp API base URL (defaults to the account's data center)
        #[arg(long, env = "MAILCHIMP_API_URL")]
        api_url: Option<String>,

        /// Resolve KEY=PATTERN audience definitions against the list names
        #[arg(short, long = "map")]
        map: Vec<AudienceDefinition>,
    },
}

struct ReportArgs<'a> {
    list_id: Option<&'a str>,
    audience: Option<&'a str>,
    since: Option<NaiveDate>,
    until: Option<NaiveDate>,
    days: u32,
    granularity: Granularity,
    watch: Option<u64>,
}

impl ReportArgs<'_> {
    fn date_range(&self) -> crate::error::Result<DateRange> {
        match (self.since, self.until) {
            (Some(since), Some(until)) => DateRange::from_dates(since, until),
            _ => DateRange::trailing_days(self.days, Utc::now()),
        }
    }
}

impl Cli {
    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Report {
                account,
                api_url,
                list_id,
                audience,
                since,
                until,
                days,
                granularity,
                watch,
            } => {
                let args = ReportArgs {
                    list_id: list_id.as_deref(),
                    audience: audience.as_deref(),
                    since: *since,
                    until: *until,
                    days: *days,
                    granularity: *granularity,
                    watch: *watch,
                };
                let provider = Self::provider(account, api_url.as_deref())?;
                self.report(&provider, &args).await
            }
            Commands::Lists {
                account,
                api_url,
                map,
            } => {
                let provider = Self::provider(account, api_url.as_deref())?;
                let lists = provider.fetch_lists().await?;
                let resolved = resolve_audiences(&lists, map);

                self.emit(&AudienceListing {
                    account: provider.account.clone(),
                    lists,
                    resolved,
                })?;
                Ok(())
            }
        }
    }

    fn provider(account: &str, api_url: Option<&str>) -> Result<MailchimpProvider> {
        let credentials = Credentials::from_env(account)?;
        let api_url = api_url.map_or_else(|| credentials.api_base_url(), str::to_string);

        Ok(MailchimpProvider::new(&api_url, credentials)?)
    }

    async fn report(&self, provider: &MailchimpProvider, args: &ReportArgs<'_>) -> Result<()> {
        // Reject bad input before any network call
        let mut range = args.date_range()?;
        if let Some(list_id) = args.list_id {
            validate_list_id(list_id)?;
        }

        let list_id = match (args.list_id, args.audience) {
            (Some(list_id), _) => Some(list_id.to_string()),
            (None, Some(name)) => {
                let list = provider.resolve_audience(name).await?;
                info!("Audience '{name}' is list {} ({})", list.id, list.name);
                Some(list.id)
            }
            (None, None) => None,
        };

        info!(
            "Collecting insights for account {} ({})",
            provider.account,
            list_id.as_deref().unwrap_or("all lists")
        );

        let scope = Scope::new(&provider.account, list_id.as_deref());
        let benchmarks = Benchmark::industry_defaults();
        let mut cache = ScopeCache::default();

        loop {
            let fetch = refresh_campaigns(&mut cache, &scope, &range, || {
                provider.fetch_campaigns(&range, list_id.as_deref())
            });

            let outcome = if args.watch.is_some() {
                tokio::select! {
                    outcome = fetch => outcome,
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, abandoning in-flight fetch");
                        break;
                    }
                }
            } else {
                fetch.await
            };

            let (report_range, campaigns) = outcome?;
            let insights = CampaignInsights::build(
                &provider.account,
                list_id.as_deref(),
                report_range,
                campaigns,
                args.granularity,
                &benchmarks,
            );
            self.emit(&insights)?;

            let Some(interval) = args.watch else {
                break;
            };

            tokio::select! {
                () = tokio::time::sleep(Duration::from_secs(interval)) => {}
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted, stopping watch");
                    break;
                }
            }

            if args.since.is_none() {
                range = args.date_range()?;
            }
        }

        Ok(())
    }

    fn emit<T: Serialize>(&self, value: &T) -> crate::error::Result<()> {
        let json_output = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };

        if let Some(output_path) = &self.output {
            std::fs::write(output_path, json_output)?;
            info!("Insights written to: {}", output_path.display());
        } else {
            println!("{json_output}");
        }

        Ok(())
    }
}

/// Fetch fresh campaigns for `scope`. When the fetch fails, fall back to the
/// collection cached for the scope along with the range it was fetched for;
/// only a scope with nothing cached yet surfaces the error.
async fn refresh_campaigns<F, Fut>(
    cache: &mut ScopeCache,
    scope: &Scope,
    range: &DateRange,
    fetch: F,
) -> crate::error::Result<(DateRange, Vec<CampaignMetrics>)>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = crate::error::Result<Vec<CampaignMetrics>>>,
{
    let error = match cache.load(scope, range, true, fetch).await {
        Ok(campaigns) => return Ok((range.clone(), campaigns)),
        Err(e) => e,
    };

    let Some((cached_range, campaigns)) = cache.latest(scope) else {
        return Err(error);
    };
    error!(
        "Refresh failed, re-emitting {} cached campaigns for {scope}: {error}",
        campaigns.len()
    );
    Ok((cached_range.clone(), campaigns.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailLensError;
    use clap::CommandFactory;
    use std::future::{ready, Ready};

    type Fetched = crate::error::Result<Vec<CampaignMetrics>>;

    fn serve(campaigns: Vec<CampaignMetrics>) -> impl FnOnce() -> Ready<Fetched> {
        move || ready(Ok(campaigns))
    }

    async fn unavailable() -> Fetched {
        Err(MailLensError::Upstream {
            status: 503,
            message: "Service Unavailable".to_string(),
        })
    }

    fn campaign(id: &str) -> CampaignMetrics {
        crate::analysis::fixtures::campaign(id, 100, 30, 3)
    }

    fn january(last_day: u32) -> DateRange {
        DateRange::from_dates(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, last_day).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_refresh_failure_without_cache_is_an_error() {
        let mut cache = ScopeCache::default();
        let scope = Scope::new("1", None);

        let result = refresh_campaigns(&mut cache, &scope, &january(31), unavailable).await;

        assert!(matches!(result, Err(MailLensError::Upstream { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_cached_campaigns() {
        let mut cache = ScopeCache::default();
        let scope = Scope::new("1", Some("abc123"));
        let fetched = serve(vec![campaign("a"), campaign("b")]);

        let (range, campaigns) = refresh_campaigns(&mut cache, &scope, &january(31), fetched)
            .await
            .unwrap();
        assert_eq!(range, january(31));
        assert_eq!(campaigns.len(), 2);

        let (range, campaigns) = refresh_campaigns(&mut cache, &scope, &january(31), unavailable)
            .await
            .unwrap();
        assert_eq!(range, january(31));
        let ids: Vec<_> = campaigns.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_failed_rolling_refresh_keeps_previous_window() {
        let mut cache = ScopeCache::default();
        let scope = Scope::new("1", None);
        refresh_campaigns(&mut cache, &scope, &january(30), serve(vec![campaign("a")]))
            .await
            .unwrap();

        let (range, campaigns) = refresh_campaigns(&mut cache, &scope, &january(31), unavailable)
            .await
            .unwrap();

        assert_eq!(range, january(30));
        assert_eq!(campaigns.len(), 1);
    }

    #[tokio::test]
    async fn test_successful_refresh_replaces_cached_campaigns() {
        let mut cache = ScopeCache::default();
        let scope = Scope::new("1", None);
        refresh_campaigns(&mut cache, &scope, &january(31), serve(vec![campaign("a")]))
            .await
            .unwrap();

        let fetched = serve(vec![campaign("b"), campaign("c")]);
        let (_, campaigns) = refresh_campaigns(&mut cache, &scope, &january(31), fetched)
            .await
            .unwrap();

        assert_eq!(campaigns.len(), 2);
        assert_eq!(cache.get(&scope, &january(31)).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_emit_to_missing_directory_is_io_error() {
        let cli = Cli::try_parse_from([
            "maillens",
            "--output",
            "/nonexistent/maillens/insights.json",
            "lists",
        ])
        .unwrap();

        let err = cli.emit(&serde_json::json!({ "lists": [] })).unwrap_err();

        assert!(matches!(err, MailLensError::Io(_)));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_report_dates_conflict_with_days() {
        let result = Cli::try_parse_from([
            "maillens", "report", "--since", "2024-01-01", "--until", "2024-01-31", "--days", "7",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn test_report_since_requires_until() {
        let result = Cli::try_parse_from(["maillens", "report", "--since", "2024-01-01"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_report_list_id_conflicts_with_audience() {
        let result =
            Cli::try_parse_from(["maillens", "report", "-l", "abc123", "-a", "newsletter"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_report_args_build_inclusive_range() {
        let args = ReportArgs {
            list_id: None,
            audience: None,
            since: NaiveDate::from_ymd_opt(2024, 1, 1),
            until: NaiveDate::from_ymd_opt(2024, 1, 31),
            days: 30,
            granularity: Granularity::Week,
            watch: None,
        };
        let range = args.date_range().unwrap();

        assert_eq!(range.start().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(range.end().to_rfc3339(), "2024-01-31T23:59:59+00:00");
    }

    #[test]
    fn test_report_args_reject_inverted_dates() {
        let args = ReportArgs {
            list_id: None,
            audience: None,
            since: NaiveDate::from_ymd_opt(2024, 2, 1),
            until: NaiveDate::from_ymd_opt(2024, 1, 1),
            days: 30,
            granularity: Granularity::Week,
            watch: None,
        };

        assert!(args.date_range().is_err());
    }

    #[test]
    fn test_lists_parses_audience_definitions() {
        let cli = Cli::try_parse_from([
            "maillens",
            "lists",
            "--map",
            "solid=Solid Lives",
            "-m",
            "rock=Rock Network",
        ])
        .unwrap();

        match cli.command {
            Commands::Lists { map, .. } => {
                assert_eq!(map.len(), 2);
                assert_eq!(map[1], AudienceDefinition::new("rock", "Rock Network"));
            }
            Commands::Report { .. } => panic!("expected lists command"),
        }
    }
}
