use serde::{Deserialize, Serialize};

use super::core::MailchimpClient;
use crate::error::Result;

const LIST_FIELDS: &str = "total_items,lists.id,lists.name";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudienceList {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub lists: Vec<AudienceList>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

impl MailchimpClient {
    /// Fetch a page of audience lists
    pub async fn fetch_list_page(&self, offset: u64, count: u64) -> Result<ListPage> {
        let url = self.endpoint_url("lists")?;

        let request = self.client.get(url).query(&[
            ("count", count.to_string()),
            ("offset", offset.to_string()),
            ("fields", LIST_FIELDS.to_string()),
        ]);
        let request = self.auth_request(request);

        let response = request.send().await?;
        Self::decode(response).await
    }
}
