//! Platform abstraction and implementations
//!
//! Two narrow traits cover exactly the capabilities the sync core needs:
//! reading an account's timeline on the source side, and creating posts,
//! reposts, and media on the destination side. Responses are parsed into the
//! crate's own types at this boundary.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{AccountCache, Toot};

pub mod mastodon;
pub mod twitter;

// Mock platforms are available for all builds to support integration tests
pub mod mock;

/// The platform posts are read from.
#[async_trait]
pub trait SourcePlatform: Send + Sync {
    /// Verify credentials and return the authenticated account's identity.
    async fn verify_credentials(&self) -> Result<AccountCache>;

    /// List the account's posts, newest-first. With `since_id` present only
    /// posts strictly newer than that id are returned.
    async fn account_statuses(&self, account_id: &str, since_id: Option<&str>)
        -> Result<Vec<Toot>>;

    /// Lowercase platform identifier, e.g. "mastodon".
    fn name(&self) -> &str;
}

/// The platform posts are mirrored to.
#[async_trait]
pub trait DestinationPlatform: Send + Sync {
    /// Verify credentials and return the authenticated account's identity.
    async fn verify_credentials(&self) -> Result<AccountCache>;

    /// Create a post, optionally as a reply and/or with uploaded media.
    /// Returns the new post's id.
    async fn create_post(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String>;

    /// Create a native repost of `target_id`. Returns the id to record as
    /// the mirror of the boost.
    async fn create_repost(&self, target_id: &str) -> Result<String>;

    /// Single-call media upload. Returns the media reference.
    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String>;

    /// Begin a chunked upload, declaring total size and media type.
    async fn upload_media_chunked_init(&self, total_bytes: u64, media_type: &str)
        -> Result<String>;

    /// Append one payload segment to a chunked upload.
    async fn upload_media_chunked_append(
        &self,
        upload_id: &str,
        bytes: Vec<u8>,
        segment_index: u32,
    ) -> Result<()>;

    /// Finalize a chunked upload. Returns the media reference.
    async fn upload_media_chunked_finalize(&self, upload_id: &str) -> Result<String>;

    /// Lowercase platform identifier, e.g. "twitter".
    fn name(&self) -> &str;
}
