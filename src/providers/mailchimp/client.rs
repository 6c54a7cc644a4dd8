mod core;
mod lists;
mod reports;

pub use self::core::MailchimpClient;
pub use lists::AudienceList;
pub use reports::RawReport;
