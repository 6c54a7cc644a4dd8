use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, warn};

use super::client::AudienceList;
use crate::error::MailLensError;

/// A local audience key and the name fragment that identifies its upstream list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudienceDefinition {
    pub key: String,
    pub name_pattern: String,
}

impl AudienceDefinition {
    pub fn new(key: &str, name_pattern: &str) -> Self {
        Self {
            key: key.to_string(),
            name_pattern: name_pattern.to_string(),
        }
    }

    fn matches(&self, list: &AudienceList) -> bool {
        list.name
            .to_lowercase()
            .contains(&self.name_pattern.to_lowercase())
    }
}

/// Parses `key=pattern`; a bare `pattern` is its own key.
impl FromStr for AudienceDefinition {
    type Err = MailLensError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (key, pattern) = value.split_once('=').unwrap_or((value, value));
        let (key, pattern) = (key.trim(), pattern.trim());

        if key.is_empty() || pattern.is_empty() {
            return Err(MailLensError::Validation(format!(
                "Invalid audience definition '{value}', expected KEY=PATTERN"
            )));
        }

        Ok(Self::new(key, pattern))
    }
}

/// Map each definition to the first list whose name contains its pattern,
/// case-insensitively. Unmatched definitions are left out.
pub fn resolve_audiences(
    lists: &[AudienceList],
    definitions: &[AudienceDefinition],
) -> IndexMap<String, AudienceList> {
    definitions
        .iter()
        .filter_map(|definition| {
            let Some(list) = lists.iter().find(|list| definition.matches(list)) else {
                warn!(
                    "No audience list matches '{}' for key '{}'",
                    definition.name_pattern, definition.key
                );
                return None;
            };

            debug!("Audience '{}' resolved to list {}", definition.key, list.id);
            Some((definition.key.clone(), list.clone()))
        })
        .collect()
}
