//! Twitter destination platform implementation
//!
//! A thin reqwest client over the endpoints the mirror needs: credential
//! verification, status create, retweet, and the simple and chunked media
//! upload protocols (uploads go to a separate host).

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::TwitterConfig;
use crate::error::{PlatformError, Result};
use crate::platforms::DestinationPlatform;
use crate::types::AccountCache;

pub struct TwitterClient {
    http: reqwest::Client,
    api_base: String,
    upload_base: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    id_str: String,
    screen_name: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    id_str: String,
}

#[derive(Debug, Deserialize)]
struct MediaResponse {
    media_id_string: String,
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| PlatformError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
            upload_base: config.upload_base_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
        })
    }

    /// Send a request with auth, mapping transport errors and non-success
    /// statuses. `on_failure` picks the error variant for HTTP failures that
    /// are not authentication problems.
    async fn send_checked(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
        on_failure: fn(String) -> PlatformError,
    ) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PlatformError::Network(format!("Twitter {} failed: {}", context, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            Err(PlatformError::Authentication(format!(
                "Twitter {} failed ({}): {}",
                context, status, body
            ))
            .into())
        } else {
            Err(on_failure(format!("Twitter {} failed ({}): {}", context, status, body)).into())
        }
    }
}

#[async_trait]
impl DestinationPlatform for TwitterClient {
    async fn verify_credentials(&self) -> Result<AccountCache> {
        let url = format!("{}/1.1/account/verify_credentials.json", self.api_base);
        let response = self
            .send_checked(self.http.get(&url), "verify credentials", PlatformError::Network)
            .await?;

        let verified: VerifyResponse = response.json().await.map_err(|e| {
            PlatformError::Network(format!("Failed to parse verify_credentials: {}", e))
        })?;

        Ok(AccountCache {
            id: verified.id_str,
            acct: Some(verified.screen_name),
        })
    }

    async fn create_post(
        &self,
        text: &str,
        in_reply_to: Option<&str>,
        media_ids: &[String],
    ) -> Result<String> {
        let url = format!("{}/1.1/statuses/update.json", self.api_base);

        let mut form: Vec<(&str, String)> = vec![("status", text.to_string())];
        if let Some(reply_to) = in_reply_to {
            form.push(("in_reply_to_status_id", reply_to.to_string()));
        }
        if !media_ids.is_empty() {
            form.push(("media_ids", media_ids.join(",")));
        }

        let response = self
            .send_checked(
                self.http.post(&url).form(&form),
                "status update",
                PlatformError::Posting,
            )
            .await?;

        let tweet: TweetResponse = response
            .json()
            .await
            .map_err(|e| PlatformError::Posting(format!("Failed to parse tweet response: {}", e)))?;

        Ok(tweet.id_str)
    }

    async fn create_repost(&self, target_id: &str) -> Result<String> {
        let url = format!("{}/1.1/statuses/retweet/{}.json", self.api_base, target_id);

        let response = self
            .send_checked(self.http.post(&url), "retweet", PlatformError::Posting)
            .await?;

        let tweet: TweetResponse = response.json().await.map_err(|e| {
            PlatformError::Posting(format!("Failed to parse retweet response: {}", e))
        })?;

        Ok(tweet.id_str)
    }

    async fn upload_media(&self, bytes: Vec<u8>) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);

        let part = reqwest::multipart::Part::bytes(bytes).file_name("media");
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .send_checked(
                self.http.post(&url).multipart(form),
                "media upload",
                PlatformError::Upload,
            )
            .await?;

        let media: MediaResponse = response.json().await.map_err(|e| {
            PlatformError::Upload(format!("Failed to parse media response: {}", e))
        })?;

        Ok(media.media_id_string)
    }

    async fn upload_media_chunked_init(
        &self,
        total_bytes: u64,
        media_type: &str,
    ) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);

        let form = [
            ("command", "INIT".to_string()),
            ("total_bytes", total_bytes.to_string()),
            ("media_type", media_type.to_string()),
        ];

        let response = self
            .send_checked(
                self.http.post(&url).form(&form),
                "media upload INIT",
                PlatformError::Upload,
            )
            .await?;

        let media: MediaResponse = response.json().await.map_err(|e| {
            PlatformError::Upload(format!("Failed to parse INIT response: {}", e))
        })?;

        Ok(media.media_id_string)
    }

    async fn upload_media_chunked_append(
        &self,
        upload_id: &str,
        bytes: Vec<u8>,
        segment_index: u32,
    ) -> Result<()> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);

        let part = reqwest::multipart::Part::bytes(bytes).file_name("media");
        let form = reqwest::multipart::Form::new()
            .text("command", "APPEND")
            .text("media_id", upload_id.to_string())
            .text("segment_index", segment_index.to_string())
            .part("media", part);

        self.send_checked(
            self.http.post(&url).multipart(form),
            "media upload APPEND",
            PlatformError::Upload,
        )
        .await?;

        Ok(())
    }

    async fn upload_media_chunked_finalize(&self, upload_id: &str) -> Result<String> {
        let url = format!("{}/1.1/media/upload.json", self.upload_base);

        let form = [
            ("command", "FINALIZE".to_string()),
            ("media_id", upload_id.to_string()),
        ];

        let response = self
            .send_checked(
                self.http.post(&url).form(&form),
                "media upload FINALIZE",
                PlatformError::Upload,
            )
            .await?;

        let media: MediaResponse = response.json().await.map_err(|e| {
            PlatformError::Upload(format!("Failed to parse FINALIZE response: {}", e))
        })?;

        Ok(media.media_id_string)
    }

    fn name(&self) -> &str {
        "twitter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TwitterConfig;

    fn config() -> TwitterConfig {
        TwitterConfig {
            access_token: "tw-token".to_string(),
            api_base_url: "https://api.twitter.com/".to_string(),
            upload_base_url: "https://upload.twitter.com".to_string(),
        }
    }

    #[test]
    fn test_client_creation_normalizes_base_urls() {
        let client = TwitterClient::new(&config()).expect("client");
        assert_eq!(client.api_base, "https://api.twitter.com");
        assert_eq!(client.upload_base, "https://upload.twitter.com");
        assert_eq!(client.name(), "twitter");
    }

    #[test]
    fn test_response_parsing() {
        let tweet: TweetResponse =
            serde_json::from_str(r#"{"id_str":"9001","text":"hi"}"#).expect("parse");
        assert_eq!(tweet.id_str, "9001");

        let media: MediaResponse =
            serde_json::from_str(r#"{"media_id_string":"777","size":12}"#).expect("parse");
        assert_eq!(media.media_id_string, "777");

        let verified: VerifyResponse =
            serde_json::from_str(r#"{"id_str":"42","screen_name":"justin"}"#).expect("parse");
        assert_eq!(verified.id_str, "42");
        assert_eq!(verified.screen_name, "justin");
    }
}
