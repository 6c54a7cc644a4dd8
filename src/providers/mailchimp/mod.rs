mod audiences;
mod client;
mod normalize;
mod provider;

pub use audiences::{resolve_audiences, AudienceDefinition};
pub use client::AudienceList;
pub use provider::{validate_list_id, MailchimpProvider};
