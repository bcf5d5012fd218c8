//! Mock platform implementations for testing
//!
//! Configurable fakes for both sides of the sync, with call recording. State
//! lives behind `Arc` so tests can keep a cloned handle while the syncer
//! owns the boxed platform.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{PlatformError, Result};
use crate::platforms::{DestinationPlatform, SourcePlatform};
use crate::types::{AccountCache, Toot};

/// Mock source platform serving a fixed, newest-first timeline.
#[derive(Clone)]
pub struct MockSource {
    account: AccountCache,
    toots: Arc<Mutex<Vec<Toot>>>,
    fail_fetch: Arc<Mutex<bool>>,
    fetch_calls: Arc<Mutex<usize>>,
}

impl MockSource {
    pub fn new(account_id: &str) -> Self {
        Self {
            account: AccountCache {
                id: account_id.to_string(),
                acct: Some("mock".to_string()),
            },
            toots: Arc::new(Mutex::new(Vec::new())),
            fail_fetch: Arc::new(Mutex::new(false)),
            fetch_calls: Arc::new(Mutex::new(0)),
        }
    }

    /// Replace the timeline (newest-first).
    pub fn set_toots(&self, toots: Vec<Toot>) {
        *self.toots.lock().unwrap() = toots;
    }

    /// Prepend a toot as the newest timeline entry.
    pub fn push_toot(&self, toot: Toot) {
        self.toots.lock().unwrap().insert(0, toot);
    }

    pub fn set_fail_fetch(&self, fail: bool) {
        *self.fail_fetch.lock().unwrap() = fail;
    }

    pub fn fetch_calls(&self) -> usize {
        *self.fetch_calls.lock().unwrap()
    }
}

#[async_trait]
impl SourcePlatform for MockSource {
    async fn verify_credentials(&self) -> Result<AccountCache> {
        Ok(self.account.clone())
    }

    async fn account_statuses(
        &self,
        _account_id: &str,
        since_id: Option<&str>,
    ) -> Result<Vec<Toot>> {
        *self.fetch_calls.lock().unwrap() += 1;

        if *self.fail_fetch.lock().unwrap() {
            return Err(PlatformError::Network("mock fetch failed".to_string()).into());
        }

        let toots = self.toots.lock().unwrap();
        let batch = match since_id {
            Some(marker) => toots
                .iter()
                .take_while(|t| t.id != marker)
                .cloned()
                .collect(),
            None => toots.clone(),
        };
        Ok(batch)
    }

    fn name(&self) -> &str {
        "mock-source"
    }
}

/// A tweet recorded by [`MockDestination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTweet {
    pub id: String,
    pub text: String,
    pub in_reply_to: Option<String>,
    pub media_ids: Vec<String>,
}

/// Mock destination platform recording every mutation call.
#[derive(Clone)]
pub struct MockDestination {
    account: AccountCache,
    post_succeeds: bool,
    created: Arc<Mutex<Vec<CreatedTweet>>>,
    reposted: Arc<Mutex<Vec<String>>>,
    uploads: Arc<Mutex<usize>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockDestination {
    pub fn new(account_id: &str) -> Self {
        Self {
            account: AccountCache {
                id: account_id.to_string(),
                acct: Some("mock".to_string()),
            },
            post_succeeds: true,
            created: Arc::new(Mutex::new(Vec::new())),
            reposted: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(0)),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// A destination whose mutation calls all fail.
    pub fn post_failure(account_id: &str) -> Self {
        Self {
            post_succeeds: false,
            ..Self::new(account_id)
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{}-{}", prefix, next)
    }

    /// Tweets created so far, oldest-first.
    pub fn created_tweets(&self) -> Vec<CreatedTweet> {
        self.created.lock().unwrap().clone()
    }

    /// Target ids passed to `create_repost`, oldest-first.
    pub fn reposted_ids(&self) -> Vec<String> {
        self.reposted.lock().unwrap().clone()
    }

    pub fn upload_count(&self) -> usize {
        *self.uploads.lock().unwrap()
    }
}

#[async_trait]
impl DestinationPlatform for MockDestination {
    async fn verify_credentials(&self) -> Result<AccountCache> {
        Ok(self.account.clone())
    }

    async fn create_post(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String> {
        if !self.post_succeeds {
            return Err(PlatformError::Posting("mock posting failed".to_string()).into());
        }

        let id = self.next_id("tw");
        self.created.lock().unwrap().push(CreatedTweet {
            id: id.clone(),
            text: text.to_string(),
            in_reply_to: in_reply_to.map(str::to_string),
            media_ids: media_ids.to_vec(),
        });
        Ok(id)
    }

    async fn create_repost(&self, target_id: &str) -> Result<String> {
        if !self.post_succeeds {
            return Err(PlatformError::Posting("mock retweet failed".to_string()).into());
        }

        self.reposted.lock().unwrap().push(target_id.to_string());
        Ok(self.next_id("rt"))
    }

    async fn upload_media(&self, _bytes: Vec<u8>) -> Result<String> {
        if !self.post_succeeds {
            return Err(PlatformError::Upload("mock upload failed".to_string()).into());
        }

        *self.uploads.lock().unwrap() += 1;
        Ok(self.next_id("media"))
    }

    async fn upload_media_chunked_init(
        &self,
        _total_bytes: u64,
        _media_type: &str,
    ) -> Result<String> {
        if !self.post_succeeds {
            return Err(PlatformError::Upload("mock upload failed".to_string()).into());
        }
        Ok(self.next_id("chunk"))
    }

    async fn upload_media_chunked_append(
        &self,
        _upload_id: &str,
        _bytes: Vec<u8>,
        _segment_index: u32,
    ) -> Result<()> {
        Ok(())
    }

    async fn upload_media_chunked_finalize(&self, _upload_id: &str) -> Result<String> {
        *self.uploads.lock().unwrap() += 1;
        Ok(self.next_id("media"))
    }

    fn name(&self) -> &str {
        "mock-destination"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_source_since_marker_is_exclusive() {
        let source = MockSource::new("42");
        source.set_toots(vec![
            Toot::plain("3", "42", "<p>c</p>", "https://s/3"),
            Toot::plain("2", "42", "<p>b</p>", "https://s/2"),
            Toot::plain("1", "42", "<p>a</p>", "https://s/1"),
        ]);

        let batch = source.account_statuses("42", Some("1")).await.expect("ok");
        let ids: Vec<&str> = batch.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);

        let all = source.account_statuses("42", None).await.expect("ok");
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_mock_destination_records_calls() {
        let dest = MockDestination::new("7");

        let id = dest
            .create_post("hello", None, &["media-9".to_string()])
            .await
            .expect("post");
        assert_eq!(id, "tw-1");

        let reply = dest.create_post("again", Some(&id), &[]).await.expect("post");
        assert_eq!(reply, "tw-2");

        let tweets = dest.created_tweets();
        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].media_ids, vec!["media-9".to_string()]);
        assert_eq!(tweets[1].in_reply_to.as_deref(), Some("tw-1"));

        dest.create_repost("tw-1").await.expect("repost");
        assert_eq!(dest.reposted_ids(), vec!["tw-1".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_destination_failure_mode() {
        let dest = MockDestination::post_failure("7");
        assert!(dest.create_post("x", None, &[]).await.is_err());
        assert!(dest.create_repost("1").await.is_err());
        assert!(dest.created_tweets().is_empty());
    }
}
