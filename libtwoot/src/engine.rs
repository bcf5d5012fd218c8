//! Mirror decision engine
//!
//! Classifies each candidate toot and decides the destination action: skip,
//! post, post-as-reply, or repost. Mappings produced this run are kept
//! in-memory (newest-first) and looked up before the persisted history, so a
//! thread whose parent was mirrored earlier in the same run links correctly.
//!
//! Platform failures never escape: each toot resolves to an explicit
//! [`MirrorOutcome`] and processing continues with the next one.

use tracing::{debug, error, info};

use crate::media::MediaRelay;
use crate::platforms::DestinationPlatform;
use crate::text::{compose_tweet, Renderer};
use crate::types::{Toot, Twoot};

/// Why a toot was not mirrored. Normal outcomes, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Already present in the mapping history.
    AlreadySynced,
    /// A reply to somebody else's toot.
    ForeignReply,
    /// A boost of a toot that was never mirrored.
    UnsyncedBoost,
    /// Dry run: the action was logged but not performed.
    DryRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Skipped(SkipReason),
    Mirrored(Twoot),
    Failed,
}

pub struct MirrorEngine<'a> {
    /// The source account owner; replies to anyone else are skipped.
    my_account_id: &'a str,
    destination: &'a dyn DestinationPlatform,
    renderer: &'a Renderer,
    relay: &'a MediaRelay,
    /// Mapping history loaded from prior runs, newest-first.
    stored: &'a [Twoot],
    /// Mappings produced this run, newest-first.
    fresh: Vec<Twoot>,
}

impl<'a> MirrorEngine<'a> {
    pub fn new(
        my_account_id: &'a str,
        destination: &'a dyn DestinationPlatform,
        renderer: &'a Renderer,
        relay: &'a MediaRelay,
        stored: &'a [Twoot],
    ) -> Self {
        Self {
            my_account_id,
            destination,
            renderer,
            relay,
            stored,
            fresh: Vec::new(),
        }
    }

    /// The mappings recorded this run, newest-first.
    pub fn into_fresh_twoots(self) -> Vec<Twoot> {
        self.fresh
    }

    fn is_synced(&self, toot_id: &str) -> bool {
        self.paired_tweet(toot_id).is_some()
    }

    /// Find the tweet paired with `toot_id`, searching this run's mappings
    /// before the persisted history.
    fn paired_tweet(&self, toot_id: &str) -> Option<&str> {
        self.fresh
            .iter()
            .chain(self.stored.iter())
            .find(|t| t.toot_id == toot_id)
            .map(|t| t.tweet_id.as_str())
    }

    fn record(&mut self, toot_id: &str, tweet_id: &str) -> Twoot {
        let twoot = Twoot {
            toot_id: toot_id.to_string(),
            tweet_id: tweet_id.to_string(),
        };
        debug!(toot_id = %twoot.toot_id, tweet_id = %twoot.tweet_id, "storing a twoot");
        self.fresh.insert(0, twoot.clone());
        twoot
    }

    /// Decide and perform the destination action for one toot.
    pub async fn process(&mut self, toot: &Toot, dry_run: bool) -> MirrorOutcome {
        if self.is_synced(&toot.id) {
            debug!(toot_id = %toot.id, "skipping a toot: already forwarded");
            return MirrorOutcome::Skipped(SkipReason::AlreadySynced);
        }

        // Reply handling: replies to other accounts are skipped; a self reply
        // remembers its parent so the tweet can continue the thread.
        let mut in_reply_to_toot_id = None;
        if let Some(replied_account) = &toot.in_reply_to_account_id {
            if replied_account != self.my_account_id {
                debug!(toot_id = %toot.id, "skipping a toot: reply to another user");
                return MirrorOutcome::Skipped(SkipReason::ForeignReply);
            }

            debug!(toot_id = %toot.id, "toot is a self reply");
            in_reply_to_toot_id = toot.in_reply_to_id.clone();
        }

        // Boost handling: a self boost of a mirrored toot becomes a retweet
        // of the paired tweet; anything else is not mirrored.
        if let Some(boosted) = &toot.reblog {
            let Some(target_tweet_id) = self.paired_tweet(&boosted.id).map(str::to_string) else {
                debug!(toot_id = %toot.id, "skipping a toot: boost of an unsynced toot");
                return MirrorOutcome::Skipped(SkipReason::UnsyncedBoost);
            };

            if dry_run {
                debug!(target = %target_tweet_id, "would retweet");
                return MirrorOutcome::Skipped(SkipReason::DryRun);
            }

            debug!(target = %target_tweet_id, "retweeting");
            return match self.destination.create_repost(&target_tweet_id).await {
                Ok(tweet_id) => {
                    let twoot = self.record(&toot.id, &tweet_id);
                    info!(toot_id = %toot.id, tweet_id = %tweet_id, "forwarded a boost as a retweet");
                    MirrorOutcome::Mirrored(twoot)
                }
                Err(e) => {
                    error!(toot_id = %toot.id, error = %e, "failed to create a retweet");
                    MirrorOutcome::Failed
                }
            };
        }

        // Plain or self-reply toot: relay media, render text, tweet.
        let remove_words: Vec<String> = toot
            .media_attachments
            .iter()
            .map(|m| m.url.clone())
            .collect();

        let mut media_ids = Vec::new();
        let media_num = if dry_run {
            toot.media_attachments.len()
        } else {
            for attachment in &toot.media_attachments {
                if let Some(media_id) = self.relay.relay(self.destination, attachment).await {
                    media_ids.push(media_id);
                }
            }
            media_ids.len()
        };

        let rendered = self.renderer.render(&toot.content, &remove_words).await;
        let text = compose_tweet(&rendered, &toot.url);

        if media_num > 0 {
            debug!(text = %text, media = media_num, "trying to tweet");
        } else {
            debug!(text = %text, "trying to tweet");
        }

        if dry_run {
            return MirrorOutcome::Skipped(SkipReason::DryRun);
        }

        // Continue the thread when the parent toot has a paired tweet.
        let reply_target = in_reply_to_toot_id
            .as_deref()
            .and_then(|id| self.paired_tweet(id))
            .map(str::to_string);

        match self
            .destination
            .create_post(&text, reply_target.as_deref(), &media_ids)
            .await
        {
            Ok(tweet_id) => {
                let twoot = self.record(&toot.id, &tweet_id);
                info!(toot_id = %toot.id, tweet_id = %tweet_id, "forwarded a toot as a tweet");
                MirrorOutcome::Mirrored(twoot)
            }
            Err(e) => {
                error!(toot_id = %toot.id, error = %e, "failed to create a tweet");
                MirrorOutcome::Failed
            }
        }
    }
}
