mod token;

pub use token::ApiKey;

use crate::error::{MailLensError, Result};

const DEFAULT_SERVER: &str = "us19";

/// API key and data-center for one named Mailchimp account.
#[derive(Debug)]
pub struct Credentials {
    pub account: String,
    pub api_key: ApiKey,
    pub server: String,
}

impl Credentials {
    pub fn new(account: &str, api_key: ApiKey, server: Option<&str>) -> Self {
        let server = server
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or_else(|| api_key.data_center())
            .unwrap_or(DEFAULT_SERVER)
            .to_string();

        Self {
            account: account.to_string(),
            api_key,
            server,
        }
    }

    /// Resolve credentials from the process environment.
    pub fn from_env(account: &str) -> Result<Self> {
        Self::from_lookup(account, |name| std::env::var(name).ok())
    }

    /// Account `1` reads `MAILCHIMP_API_KEY`/`MAILCHIMP_SERVER`; account `N`
    /// reads the same names suffixed with `_N`.
    pub fn from_lookup<F>(account: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let account = account.trim();
        if account.is_empty() || !account.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(MailLensError::Validation(format!(
                "Invalid account identifier '{account}'"
            )));
        }

        let suffix = if account == "1" {
            String::new()
        } else {
            format!("_{account}")
        };
        let key_var = format!("MAILCHIMP_API_KEY{suffix}");
        let server_var = format!("MAILCHIMP_SERVER{suffix}");

        let api_key = lookup(&key_var)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                MailLensError::Config(format!(
                    "No API key configured for account '{account}' (set {key_var})"
                ))
            })?;
        let server = lookup(&server_var);

        Ok(Self::new(
            account,
            ApiKey::from(api_key.as_str()),
            server.as_deref(),
        ))
    }

    pub fn api_base_url(&self) -> String {
        format!("https://{}.api.mailchimp.com/3.0/", self.server)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_primary_account_reads_unsuffixed_vars() {
        let vars = env(&[("MAILCHIMP_API_KEY", "key-us21"), ("MAILCHIMP_SERVER", "us6")]);
        let creds = Credentials::from_lookup("1", |name| vars.get(name).cloned()).unwrap();

        assert_eq!(creds.account, "1");
        assert_eq!(creds.api_key.as_str(), "key-us21");
        assert_eq!(creds.server, "us6");
    }

    #[test]
    fn test_secondary_account_reads_suffixed_vars() {
        let vars = env(&[
            ("MAILCHIMP_API_KEY", "primary-us1"),
            ("MAILCHIMP_API_KEY_2", "secondary-us2"),
        ]);
        let creds = Credentials::from_lookup("2", |name| vars.get(name).cloned()).unwrap();

        assert_eq!(creds.api_key.as_str(), "secondary-us2");
        assert_eq!(creds.server, "us2");
    }

    #[test]
    fn test_server_falls_back_to_default() {
        let vars = env(&[("MAILCHIMP_API_KEY", "plainkey")]);
        let creds = Credentials::from_lookup("1", |name| vars.get(name).cloned()).unwrap();

        assert_eq!(creds.server, "us19");
        assert_eq!(creds.api_base_url(), "https://us19.api.mailchimp.com/3.0/");
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let vars = env(&[("MAILCHIMP_API_KEY", "key-us21")]);
        let err = Credentials::from_lookup("3", |name| vars.get(name).cloned()).unwrap_err();

        assert!(matches!(err, MailLensError::Config(_)));
        assert!(err.to_string().contains("MAILCHIMP_API_KEY_3"));
    }

    #[test]
    fn test_blank_key_is_config_error() {
        let vars = env(&[("MAILCHIMP_API_KEY", "   ")]);
        let err = Credentials::from_lookup("1", |name| vars.get(name).cloned()).unwrap_err();

        assert!(matches!(err, MailLensError::Config(_)));
    }

    #[test]
    fn test_invalid_account_is_validation_error() {
        let err = Credentials::from_lookup("../etc", |_| None).unwrap_err();

        assert!(matches!(err, MailLensError::Validation(_)));
    }
}
