//! Sync orchestration
//!
//! One `run` performs a complete fetch-decide-mirror-persist pass:
//! fetch candidate toots newer than the marker, process them oldest-first
//! through the mirror engine, then persist the fresh mappings in one batch.
//!
//! Marker advancement is decoupled from mirror success on purpose: the fetch
//! marker moves the moment a batch is seen, so a toot whose tweet creation
//! fails is never refetched or retried. Accepting the occasional lost toot
//! avoids reprocessing storms when the destination is down.

use tracing::{debug, warn};

use crate::config::Profile;
use crate::engine::MirrorEngine;
use crate::error::{ConfigError, Result};
use crate::media::MediaRelay;
use crate::platforms::{DestinationPlatform, SourcePlatform};
use crate::store::{MarkerKind, SyncData, SyncStore};
use crate::text::Renderer;
use crate::types::Toot;

pub struct Syncer {
    profile: Profile,
    store: SyncStore,
    data: SyncData,
    source: Box<dyn SourcePlatform>,
    destination: Box<dyn DestinationPlatform>,
    renderer: Renderer,
    relay: MediaRelay,
}

impl Syncer {
    /// Build a syncer for the named profile with real platform clients.
    pub fn new(profile_name: &str, profile: Profile) -> Result<Self> {
        let source = crate::platforms::mastodon::MastodonSource::new(&profile.mastodon)?;
        let destination = crate::platforms::twitter::TwitterClient::new(&profile.twitter)?;
        let store = SyncStore::new(
            crate::config::resolve_data_dir()?.join(format!("{}.json", profile_name)),
        );

        Self::with_platforms(profile, store, Box::new(source), Box::new(destination))
    }

    /// Build a syncer with injected platforms. Test seam.
    pub fn with_platforms(
        profile: Profile,
        store: SyncStore,
        source: Box<dyn SourcePlatform>,
        destination: Box<dyn DestinationPlatform>,
    ) -> Result<Self> {
        Ok(Self {
            profile,
            store,
            data: SyncData::default(),
            source,
            destination,
            renderer: Renderer::new()?,
            relay: MediaRelay::new()?,
        })
    }

    /// Number of mappings in the in-memory view of the persisted history.
    pub fn stored_twoots(&self) -> usize {
        self.data.twoots.len()
    }

    /// Load persisted state and make sure both account identities are cached.
    ///
    /// Verification runs only when the cache is missing; a verification
    /// failure is fatal for the process.
    async fn prepare(&mut self) -> Result<()> {
        self.data = self.store.load()?;

        if self.data.mastodon_account.is_none() {
            debug!("fetching Mastodon account information (verify credentials)");
            self.data.mastodon_account = Some(self.source.verify_credentials().await?);
        }

        if self.data.twitter_account.is_none() {
            debug!("fetching Twitter account information (verify credentials)");
            self.data.twitter_account = Some(self.destination.verify_credentials().await?);
        }

        self.store.save(&self.data)
    }

    /// Fetch toots newer than the last-seen marker, newest-first.
    ///
    /// Without a marker, the fetch only seeds one and the batch is withheld
    /// from processing. Any non-empty fetch advances the marker immediately
    /// through the store's direct write path, unless this is a pure dry run.
    /// A failed fetch degrades to an empty batch.
    async fn fetch_new_toots(&mut self, dry_run: bool, update: bool) -> Result<Vec<Toot>> {
        let my_id = match &self.data.mastodon_account {
            Some(account) => account.id.clone(),
            None => {
                return Err(ConfigError::MissingField("mastodon account cache".to_string()).into())
            }
        };
        debug!(account = %my_id, "Mastodon user");

        let last_id = self.data.last_toot.clone();
        if last_id.is_some() {
            debug!("getting new toots for sync");
        } else {
            debug!("getting new toots only for fetching information");
        }

        let batch = match self
            .source
            .account_statuses(&my_id, last_id.as_deref())
            .await
        {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "failed to get new toots");
                return Ok(Vec::new());
            }
        };

        if let Some(newest) = batch.first() {
            if !dry_run || update {
                debug!(last_toot = %newest.id, "updating the last toot");
                self.store.update_marker(MarkerKind::LastToot, &newest.id)?;
                self.data.last_toot = Some(newest.id.clone());
            }
        }

        if last_id.is_none() {
            return Ok(Vec::new());
        }

        debug!(count = batch.len(), "number of new toots");
        Ok(batch)
    }

    /// Execute one sync run.
    ///
    /// `update` allows marker advancement during a dry run (testing and
    /// backfill); `setup` verifies accounts and seeds markers only.
    pub async fn run(&mut self, dry_run: bool, update: bool, setup: bool) -> Result<()> {
        let dry_run = if dry_run && setup {
            warn!("dry run has no effect in setup mode");
            false
        } else {
            dry_run
        };
        if dry_run {
            debug!("dry running");
        }

        self.prepare().await?;

        let toots = self.fetch_new_toots(dry_run, update).await?;

        if !setup {
            let my_id = match &self.data.mastodon_account {
                Some(account) => account.id.clone(),
                None => {
                    return Err(
                        ConfigError::MissingField("mastodon account cache".to_string()).into(),
                    )
                }
            };

            let mut engine = MirrorEngine::new(
                &my_id,
                self.destination.as_ref(),
                &self.renderer,
                &self.relay,
                &self.data.twoots,
            );

            // process from the oldest one
            for toot in toots.iter().rev() {
                engine.process(toot, dry_run).await;
            }

            let fresh = engine.into_fresh_twoots();
            if !fresh.is_empty() {
                debug!(path = %self.store.path().display(), "saving up-to-date data");
                self.data = self.store.append_and_save(fresh, self.profile.max_twoots)?;
            }
        }

        debug!(count = self.data.twoots.len(), "number of stored twoots");
        Ok(())
    }
}
