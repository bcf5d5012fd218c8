//! Core types for twoot-sync
//!
//! Platform responses are parsed into these tagged structures at the client
//! boundary; nothing downstream touches raw API payloads.

use serde::{Deserialize, Serialize};

/// A post on the source (Mastodon) platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toot {
    pub id: String,
    /// Id of the account that authored this toot.
    pub account_id: String,
    /// Raw HTML content as delivered by the Mastodon API.
    pub content: String,
    pub in_reply_to_id: Option<String>,
    pub in_reply_to_account_id: Option<String>,
    /// The boosted toot, when this toot is a boost.
    pub reblog: Option<Box<Toot>>,
    pub media_attachments: Vec<MediaAttachment>,
    /// Canonical permalink.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    /// Animated video ("gifv" in the Mastodon API).
    Gifv,
    Other(String),
}

/// A recorded pairing of one toot id and the tweet id it produced.
///
/// Invariant: `toot_id` is unique across the mapping history; a toot is
/// mirrored at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twoot {
    pub toot_id: String,
    pub tweet_id: String,
}

/// Cached account identity, fetched once via credential verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCache {
    pub id: String,
    #[serde(default)]
    pub acct: Option<String>,
}

impl Toot {
    /// Minimal constructor used by tests and mocks.
    pub fn plain(id: &str, account_id: &str, content: &str, url: &str) -> Self {
        Self {
            id: id.to_string(),
            account_id: account_id.to_string(),
            content: content.to_string(),
            in_reply_to_id: None,
            in_reply_to_account_id: None,
            reblog: None,
            media_attachments: Vec::new(),
            url: url.to_string(),
        }
    }
}
