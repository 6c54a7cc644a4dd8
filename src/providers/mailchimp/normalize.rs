use crate::models::{CampaignMetrics, ClickStats, OpenStats, UNTITLED};

use super::client::RawReport;

/// Map an upstream report into the canonical record. Total: missing nested
/// objects and leaf fields default to zero.
pub fn normalize(raw: &RawReport) -> CampaignMetrics {
    let opens = raw.opens.clone().unwrap_or_default();
    let clicks = raw.clicks.clone().unwrap_or_default();
    let settings = raw.settings.clone().unwrap_or_default();

    let title = raw
        .subject_line
        .as_ref()
        .or(settings.subject_line.as_ref())
        .or(raw.campaign_title.as_ref())
        .or(raw.title.as_ref())
        .or(settings.title.as_ref())
        .map_or_else(|| UNTITLED.to_string(), |t| t.trim().to_string());

    CampaignMetrics {
        id: raw.id.clone().unwrap_or_default(),
        send_time: raw.send_time,
        title,
        emails_sent: raw.emails_sent.unwrap_or(0),
        opens: OpenStats {
            total_opens: opens.opens_total.unwrap_or(0),
            unique_opens: opens.unique_opens.unwrap_or(0),
            open_rate: opens.open_rate.unwrap_or(0.0),
        },
        clicks: ClickStats {
            total_clicks: clicks.clicks_total.unwrap_or(0),
            unique_clicks: clicks.unique_clicks.unwrap_or(0),
            click_rate: clicks.click_rate.unwrap_or(0.0),
        },
        unsubscribed: raw.unsubscribed.unwrap_or(0),
        abuse_reports: raw.abuse_reports.unwrap_or(0),
        forwards: raw
            .forwards
            .as_ref()
            .and_then(|f| f.forwards_count)
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw(value: Value) -> RawReport {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_missing_nested_objects_default_to_zero() {
        let metrics = normalize(&raw(json!({
            "id": "c1",
            "send_time": "2024-01-15T10:00:00+00:00",
            "emails_sent": 120
        })));

        assert_eq!(metrics.emails_sent, 120);
        assert_eq!(metrics.opens, OpenStats::default());
        assert_eq!(metrics.clicks, ClickStats::default());
        assert_eq!(metrics.forwards, 0);
        assert_eq!(metrics.unsubscribed, 0);
        assert_eq!(metrics.abuse_reports, 0);
        assert_eq!(metrics.title, "Untitled");
    }

    #[test]
    fn test_missing_leaf_fields_default_to_zero() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "opens": { "unique_opens": 7 },
            "clicks": {},
            "forwards": { "forwards_opens": 3 }
        })));

        assert_eq!(metrics.id, "");
        assert_eq!(metrics.emails_sent, 0);
        assert_eq!(metrics.opens.unique_opens, 7);
        assert_eq!(metrics.opens.total_opens, 0);
        assert_eq!(metrics.opens.open_rate, 0.0);
        assert_eq!(metrics.clicks.unique_clicks, 0);
        assert_eq!(metrics.forwards, 0);
    }

    #[test]
    fn test_huge_counts_aggregate_without_overflow() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "emails_sent": 18_000_000_000_000_000_000_u64,
            "opens": { "unique_opens": 1e20 }
        })));

        assert_eq!(metrics.opens.unique_opens, 0);
        let totals = crate::analysis::aggregate(&[metrics.clone(), metrics]);
        assert_eq!(totals.total_sent, u64::MAX);
        assert_eq!(totals.total_unique_opens, 0);
    }

    #[test]
    fn test_full_report_maps_every_field() {
        let metrics = normalize(&raw(json!({
            "id": "42a1",
            "send_time": "2024-01-15T10:00:00+00:00",
            "subject_line": "Sunday update",
            "campaign_title": "Weekly #3",
            "emails_sent": 1000,
            "opens": { "opens_total": 500, "unique_opens": 300, "open_rate": 0.3 },
            "clicks": { "clicks_total": 45, "unique_clicks": 30, "click_rate": 0.03 },
            "unsubscribed": 4,
            "abuse_reports": 1,
            "forwards": { "forwards_count": 6, "forwards_opens": 2 }
        })));

        assert_eq!(metrics.id, "42a1");
        assert_eq!(metrics.title, "Sunday update");
        assert_eq!(metrics.emails_sent, 1000);
        assert_eq!(metrics.opens.total_opens, 500);
        assert_eq!(metrics.opens.unique_opens, 300);
        assert_eq!(metrics.opens.open_rate, 0.3);
        assert_eq!(metrics.clicks.total_clicks, 45);
        assert_eq!(metrics.clicks.unique_clicks, 30);
        assert_eq!(metrics.clicks.click_rate, 0.03);
        assert_eq!(metrics.unsubscribed, 4);
        assert_eq!(metrics.abuse_reports, 1);
        assert_eq!(metrics.forwards, 6);
    }

    #[test]
    fn test_title_prefers_subject_line() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "subject_line": "Subject",
            "campaign_title": "Campaign"
        })));

        assert_eq!(metrics.title, "Subject");
    }

    #[test]
    fn test_title_falls_back_to_campaign_title() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "subject_line": "   ",
            "campaign_title": "Campaign"
        })));

        assert_eq!(metrics.title, "Campaign");
    }

    #[test]
    fn test_title_reads_legacy_settings_shape() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "settings": { "title": "From settings" }
        })));

        assert_eq!(metrics.title, "From settings");
    }

    #[test]
    fn test_negative_counts_are_clamped_to_zero() {
        let metrics = normalize(&raw(json!({
            "send_time": "2024-01-15T10:00:00Z",
            "emails_sent": -10,
            "opens": { "unique_opens": -1, "open_rate": -0.5 }
        })));

        assert_eq!(metrics.emails_sent, 0);
        assert_eq!(metrics.opens.unique_opens, 0);
        assert_eq!(metrics.opens.open_rate, 0.0);
    }
}
