//! twoot-sync core - one-way Mastodon to Twitter synchronization
//!
//! This library implements the sync and de-duplication engine: deciding, for
//! each newly observed toot, whether and how to mirror it to the destination
//! platform, tracking toot/tweet id pairs persistently, and guaranteeing
//! idempotent, crash-safe progress across runs.

pub mod config;
pub mod engine;
pub mod error;
pub mod lock;
pub mod media;
pub mod platforms;
pub mod store;
pub mod sync;
pub mod text;
pub mod types;

// Re-export commonly used types
pub use config::Profile;
pub use engine::{MirrorEngine, MirrorOutcome, SkipReason};
pub use error::{Result, TwootError};
pub use store::{MarkerKind, SyncData, SyncStore};
pub use sync::Syncer;
pub use types::{AccountCache, MediaAttachment, MediaKind, Toot, Twoot};
