//! Mastodon source platform implementation
//!
//! Built on the megalodon library, so any Fediverse instance speaking the
//! Mastodon API works as a source. API payloads are converted to [`Toot`]
//! here; nothing outside this module sees megalodon entities.

use async_trait::async_trait;
use megalodon::megalodon::GetAccountStatusesInputOptions;
use megalodon::{entities, Megalodon, SNS};

use crate::config::MastodonConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::SourcePlatform;
use crate::types::{AccountCache, MediaAttachment, MediaKind, Toot};

pub struct MastodonSource {
    client: Box<dyn Megalodon + Send + Sync>,
}

impl MastodonSource {
    pub fn new(config: &MastodonConfig) -> Result<Self> {
        // Ensure the instance URL has a scheme
        let base_url = if config.api_base_url.starts_with("http://")
            || config.api_base_url.starts_with("https://")
        {
            config.api_base_url.clone()
        } else {
            format!("https://{}", config.api_base_url)
        };

        let client = megalodon::generator(
            SNS::Mastodon,
            base_url,
            Some(config.access_token.clone()),
            None,
        )
        .map_err(|e| {
            PlatformError::Authentication(format!("Failed to create Mastodon client: {:?}", e))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourcePlatform for MastodonSource {
    async fn verify_credentials(&self) -> Result<AccountCache> {
        let response = self
            .client
            .verify_account_credentials()
            .await
            .map_err(|e| map_megalodon_error(e, "verify credentials"))?;

        Ok(AccountCache {
            id: response.json.id,
            acct: Some(response.json.acct),
        })
    }

    async fn account_statuses(
        &self,
        account_id: &str,
        since_id: Option<&str>,
    ) -> Result<Vec<Toot>> {
        let options = GetAccountStatusesInputOptions {
            since_id: since_id.map(str::to_string),
            ..Default::default()
        };

        let response = self
            .client
            .get_account_statuses(account_id.to_string(), Some(&options))
            .await
            .map_err(|e| map_megalodon_error(e, "get account statuses"))?;

        Ok(response.json.iter().map(toot_from_status).collect())
    }

    fn name(&self) -> &str {
        "mastodon"
    }
}

/// Parse a megalodon status into the crate's own post type.
fn toot_from_status(status: &entities::Status) -> Toot {
    Toot {
        id: status.id.clone(),
        account_id: status.account.id.clone(),
        content: status.content.clone(),
        in_reply_to_id: status.in_reply_to_id.clone(),
        in_reply_to_account_id: status.in_reply_to_account_id.clone(),
        reblog: status
            .reblog
            .as_ref()
            .map(|boosted| Box::new(toot_from_status(boosted))),
        media_attachments: status
            .media_attachments
            .iter()
            .map(|attachment| MediaAttachment {
                kind: media_kind(&attachment.r#type),
                url: attachment.url.clone(),
            })
            .collect(),
        // fall back to the federation URI when no permalink is present
        url: status.url.clone().unwrap_or_else(|| status.uri.clone()),
    }
}

fn media_kind(attachment_type: &entities::attachment::AttachmentType) -> MediaKind {
    use entities::attachment::AttachmentType;

    match attachment_type {
        AttachmentType::Image => MediaKind::Image,
        AttachmentType::Gifv => MediaKind::Gifv,
        other => MediaKind::Other(format!("{:?}", other).to_lowercase()),
    }
}

fn map_megalodon_error(error: megalodon::error::Error, context: &str) -> PlatformError {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("forbidden")
        || lower.contains("token")
    {
        PlatformError::Authentication(format!("Mastodon {} failed: {}", context, message))
    } else {
        PlatformError::Network(format!("Mastodon {} failed: {}", context, message))
    }
}
