//! Roster records as supplied by the user directory.

use serde::{Deserialize, Serialize};

/// A known user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRecord {
    /// Login name, matched against message senders and `@mentions`.
    #[serde(rename = "UserName")]
    pub user_name: String,

    /// Name shown next to messages.
    #[serde(rename = "FullName")]
    pub full_name: String,

    /// Avatar image reference, if the user has one.
    #[serde(rename = "ImageURL", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}
