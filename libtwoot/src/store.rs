//! Persisted marker and mapping store
//!
//! One JSON document per profile holds the fetch markers, cached account
//! identities, and the bounded toot/tweet mapping history. The store has two
//! write paths with different timing:
//!
//! - `update_marker` persists a single marker immediately, so a crash mid-run
//!   cannot cause the next run to refetch an already-seen batch;
//! - `append_and_save` is the end-of-run bulk save for fresh mappings.
//!
//! Both are read-modify-write cycles over the full document. The run model is
//! single-threaded and the process holds an exclusive lock, so the two paths
//! cannot race.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::types::{AccountCache, Twoot};

/// The single persisted record for one profile.
///
/// Every field defaults when absent so older data files keep loading.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncData {
    /// Id of the most recently processed toot (fetch cursor).
    #[serde(default)]
    pub last_toot: Option<String>,

    /// Reverse-direction cursor. Kept for layout compatibility; the
    /// tweets-to-toots direction is disabled.
    #[serde(default)]
    pub last_tweet: Option<String>,

    #[serde(default)]
    pub mastodon_account: Option<AccountCache>,

    #[serde(default)]
    pub twitter_account: Option<AccountCache>,

    /// Mapping history, newest-first.
    #[serde(default)]
    pub twoots: Vec<Twoot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    LastToot,
    LastTweet,
}

pub struct SyncStore {
    path: PathBuf,
}

impl SyncStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted record.
    ///
    /// A missing file yields empty defaults; an unreadable or corrupt file is
    /// an error (the run cannot safely proceed without markers).
    pub fn load(&self) -> Result<SyncData> {
        if !self.path.exists() {
            return Ok(SyncData::default());
        }

        let content = std::fs::read_to_string(&self.path).map_err(StorageError::Io)?;
        let data = serde_json::from_str(&content).map_err(StorageError::Corrupt)?;
        Ok(data)
    }

    /// Write the full record atomically (temp file + rename).
    pub fn save(&self, data: &SyncData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        let json = serde_json::to_string_pretty(data).map_err(StorageError::Corrupt)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(StorageError::Io)?;
        std::fs::rename(&tmp, &self.path).map_err(StorageError::Io)?;
        Ok(())
    }

    /// Persist a single marker update immediately.
    ///
    /// Reloads the latest on-disk record rather than trusting any in-memory
    /// snapshot, updates the one field, and writes back.
    pub fn update_marker(&self, kind: MarkerKind, value: &str) -> Result<()> {
        let mut data = self.load()?;

        match kind {
            MarkerKind::LastToot => data.last_toot = Some(value.to_string()),
            MarkerKind::LastTweet => data.last_tweet = Some(value.to_string()),
        }

        self.save(&data)
    }

    /// Prepend this run's fresh mappings to the freshest persisted history,
    /// truncate to the retention limit, and write back.
    ///
    /// Returns the saved record so the caller's in-memory view stays current.
    pub fn append_and_save(&self, fresh: Vec<Twoot>, max_twoots: usize) -> Result<SyncData> {
        let mut data = self.load()?;

        let mut twoots = fresh;
        twoots.extend(data.twoots);
        twoots.truncate(max_twoots);
        data.twoots = twoots;

        self.save(&data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twoot(toot_id: &str, tweet_id: &str) -> Twoot {
        Twoot {
            toot_id: toot_id.to_string(),
            tweet_id: tweet_id.to_string(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> SyncStore {
        SyncStore::new(dir.path().join("default.json"))
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let data = store.load().expect("load");
        assert!(data.last_toot.is_none());
        assert!(data.last_tweet.is_none());
        assert!(data.twoots.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let mut data = SyncData::default();
        data.last_toot = Some("101".to_string());
        data.mastodon_account = Some(AccountCache {
            id: "42".to_string(),
            acct: Some("justin".to_string()),
        });
        data.twoots.push(twoot("101", "9001"));
        store.save(&data).expect("save");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.last_toot.as_deref(), Some("101"));
        assert_eq!(loaded.mastodon_account.unwrap().id, "42");
        assert_eq!(loaded.twoots, vec![twoot("101", "9001")]);
    }

    #[test]
    fn test_update_marker_persists_independently() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let mut data = SyncData::default();
        data.twoots.push(twoot("1", "10"));
        store.save(&data).expect("save");

        store
            .update_marker(MarkerKind::LastToot, "55")
            .expect("update marker");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.last_toot.as_deref(), Some("55"));
        // the rest of the record is untouched
        assert_eq!(loaded.twoots, vec![twoot("1", "10")]);
    }

    #[test]
    fn test_update_marker_without_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        store
            .update_marker(MarkerKind::LastTweet, "77")
            .expect("update marker");

        let loaded = store.load().expect("load");
        assert_eq!(loaded.last_tweet.as_deref(), Some("77"));
    }

    #[test]
    fn test_append_and_save_prepends_newest_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let mut data = SyncData::default();
        data.twoots = vec![twoot("2", "20"), twoot("1", "10")];
        store.save(&data).expect("save");

        let saved = store
            .append_and_save(vec![twoot("4", "40"), twoot("3", "30")], 100)
            .expect("append");

        let ids: Vec<&str> = saved.twoots.iter().map(|t| t.toot_id.as_str()).collect();
        assert_eq!(ids, vec!["4", "3", "2", "1"]);
    }

    #[test]
    fn test_append_and_save_truncates_to_retention_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let mut data = SyncData::default();
        data.twoots = (1..=5).map(|i| twoot(&i.to_string(), "x")).collect();
        store.save(&data).expect("save");

        let saved = store
            .append_and_save(vec![twoot("7", "70"), twoot("6", "60")], 5)
            .expect("append");

        assert_eq!(saved.twoots.len(), 5);
        let ids: Vec<&str> = saved.twoots.iter().map(|t| t.toot_id.as_str()).collect();
        assert_eq!(ids, vec!["7", "6", "1", "2", "3"]);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default.json");
        std::fs::write(&path, "not json at all").expect("write");

        let store = SyncStore::new(path);
        let result = store.load();
        assert!(matches!(
            result,
            Err(crate::error::TwootError::Storage(StorageError::Corrupt(_)))
        ));
    }

    #[test]
    fn test_forward_compatible_load_tolerates_missing_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default.json");
        std::fs::write(&path, r#"{"last_toot":"9"}"#).expect("write");

        let store = SyncStore::new(path);
        let data = store.load().expect("load");
        assert_eq!(data.last_toot.as_deref(), Some("9"));
        assert!(data.twoots.is_empty());
        assert!(data.twitter_account.is_none());
    }
}
