pub struct ApiKey(String);

impl From<&str> for ApiKey {
    fn from(value: &str) -> Self {
        Self(value.trim().to_owned())
    }
}

impl ApiKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Data-center suffix embedded in Mailchimp keys (`<hex>-us21` yields `us21`).
    pub fn data_center(&self) -> Option<&str> {
        self.0
            .rsplit_once('-')
            .map(|(_, dc)| dc)
            .filter(|dc| !dc.is_empty() && dc.chars().all(|c| c.is_ascii_alphanumeric()))
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<redacted>")
    }
}
