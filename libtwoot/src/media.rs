//! Media relay: download an attachment from the source platform and
//! re-upload it to the destination.
//!
//! Every failure here is local to one attachment: log a warning and yield
//! nothing, so a toot with a broken attachment still mirrors with whatever
//! media survived.

use tracing::warn;

use crate::error::{PlatformError, Result};
use crate::platforms::DestinationPlatform;
use crate::types::{MediaAttachment, MediaKind};

pub struct MediaRelay {
    http: reqwest::Client,
}

impl MediaRelay {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    /// Relay one attachment; `None` means it contributed no media reference.
    pub async fn relay(
        &self,
        destination: &dyn DestinationPlatform,
        attachment: &MediaAttachment,
    ) -> Option<String> {
        match &attachment.kind {
            MediaKind::Image => {
                let (bytes, _mime) = self.download(&attachment.url, "image").await?;
                match destination.upload_media(bytes).await {
                    Ok(media_id) => Some(media_id),
                    Err(e) => {
                        warn!(url = %attachment.url, error = %e, "failed to upload an image");
                        None
                    }
                }
            }
            MediaKind::Gifv => {
                let (bytes, mime) = self.download(&attachment.url, "video").await?;
                match self.upload_chunked(destination, bytes, &mime).await {
                    Ok(media_id) => Some(media_id),
                    Err(e) => {
                        warn!(url = %attachment.url, error = %e, "failed to upload a video");
                        None
                    }
                }
            }
            MediaKind::Other(kind) => {
                warn!(kind = %kind, "unknown media type, skipping");
                None
            }
        }
    }

    /// Download the attachment, checking HTTP status and content type.
    async fn download(&self, url: &str, expected_type: &str) -> Option<(Vec<u8>, String)> {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "failed to fetch media");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(url = %url, status = %response.status(), "failed to get media");
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !content_type.contains(expected_type) {
            warn!(url = %url, content_type = %content_type, expected = %expected_type,
                "media has unexpected content type");
            return None;
        }

        match response.bytes().await {
            Ok(bytes) => Some((bytes.to_vec(), content_type)),
            Err(e) => {
                warn!(url = %url, error = %e, "failed to read media body");
                None
            }
        }
    }

    /// Three-phase chunked upload: declare size and type, send the payload as
    /// a single segment, finalize.
    async fn upload_chunked(
        &self,
        destination: &dyn DestinationPlatform,
        bytes: Vec<u8>,
        mime: &str,
    ) -> Result<String> {
        let total = bytes.len() as u64;
        let upload_id = destination.upload_media_chunked_init(total, mime).await?;
        destination
            .upload_media_chunked_append(&upload_id, bytes, 0)
            .await?;
        destination.upload_media_chunked_finalize(&upload_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platforms::mock::MockDestination;

    #[tokio::test]
    async fn test_unknown_media_kind_yields_none() {
        let relay = MediaRelay::new().expect("relay");
        let destination = MockDestination::new("700");

        let attachment = MediaAttachment {
            kind: MediaKind::Other("audio".to_string()),
            url: "https://s/media/track.mp3".to_string(),
        };

        assert!(relay.relay(&destination, &attachment).await.is_none());
        assert_eq!(destination.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_download_yields_none() {
        let relay = MediaRelay::new().expect("relay");
        let destination = MockDestination::new("700");

        // nothing listens on this port, so the fetch fails immediately
        let attachment = MediaAttachment {
            kind: MediaKind::Image,
            url: "http://127.0.0.1:1/cat.png".to_string(),
        };

        assert!(relay.relay(&destination, &attachment).await.is_none());
        assert_eq!(destination.upload_count(), 0);
    }
}
