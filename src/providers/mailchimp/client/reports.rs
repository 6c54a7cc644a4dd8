use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::core::MailchimpClient;
use crate::error::Result;
use crate::models::DateRange;

/// Projection of the `/reports` collection; only what the normalizer reads.
const REPORT_FIELDS: &str = "total_items,reports.id,reports.send_time,reports.subject_line,\
reports.campaign_title,reports.emails_sent,reports.opens,reports.clicks,\
reports.unsubscribed,reports.abuse_reports,reports.forwards";

/// A campaign report as the upstream sends it. Everything except `send_time`
/// is optional, and values of the wrong JSON type are treated as absent.
#[derive(Debug, Clone, Deserialize)]
pub struct RawReport {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    pub send_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub subject_line: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub campaign_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    /// Campaign-list shape nests the titles here.
    #[serde(default, deserialize_with = "lenient_object")]
    pub settings: Option<RawSettings>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub emails_sent: Option<u64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub opens: Option<RawOpens>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub clicks: Option<RawClicks>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unsubscribed: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub abuse_reports: Option<u64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub forwards: Option<RawForwards>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSettings {
    #[serde(default, deserialize_with = "lenient_text")]
    pub subject_line: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawOpens {
    #[serde(default, deserialize_with = "lenient_count")]
    pub opens_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unique_opens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub open_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawClicks {
    #[serde(default, deserialize_with = "lenient_count")]
    pub clicks_total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub unique_clicks: Option<u64>,
    #[serde(default, deserialize_with = "lenient_rate")]
    pub click_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawForwards {
    #[serde(default, deserialize_with = "lenient_count")]
    pub forwards_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ReportPage {
    #[serde(default)]
    pub reports: Vec<RawReport>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    // u64::MAX as f64 rounds up to 2^64, so the bound is exclusive
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let count = lenient_rate(deserializer)?
        .map(f64::round)
        .filter(|v| *v < u64::MAX as f64)
        .map(|v| v as u64);
    Ok(count)
}

fn lenient_rate<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?
        .as_f64()
        .filter(|v| v.is_finite() && *v >= 0.0))
}

fn lenient_object<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn timestamp_param(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl MailchimpClient {
    /// Fetch one page of send reports for the window, newest first.
    pub async fn fetch_report_page(
        &self,
        range: &DateRange,
        list_id: Option<&str>,
        offset: u64,
        count: u64,
    ) -> Result<ReportPage> {
        let url = self.endpoint_url("reports")?;

        // before_send_time is exclusive upstream
        let before = range.end() + Duration::seconds(1);

        let mut request = self.client.get(url).query(&[
            ("count", count.to_string()),
            ("offset", offset.to_string()),
            ("since_send_time", timestamp_param(range.start())),
            ("before_send_time", timestamp_param(before)),
            ("sort_field", "send_time".to_string()),
            ("sort_dir", "DESC".to_string()),
            ("fields", REPORT_FIELDS.to_string()),
        ]);
        if let Some(list_id) = list_id {
            request = request.query(&[("list_id", list_id)]);
        }
        request = self.auth_request(request);

        let response = request.send().await?;
        Self::decode(response).await
    }
}
