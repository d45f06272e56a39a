//! Production client for the remote music service.
//!
//! Wraps `reqwest` with bearer-token state, Basic-auth token endpoints and
//! status-to-error mapping. Sensitive values (tokens, codes) are never
//! logged.

use crate::api::MusicService;
use crate::error::{RemoteError, Result};
use crate::types::{
    ArtistDetails, PageQuery, PlaylistSummary, PlaylistsPage, SavedTracksPage, TokenPair,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use core_runtime::RuntimeConfig;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};
use url::Url;

/// The artists endpoint accepts at most this many ids per request.
const ARTIST_CHUNK_SIZE: usize = 50;

/// The playlist-tracks endpoint accepts at most this many URIs per request.
const PLAYLIST_ADD_CHUNK_SIZE: usize = 50;

/// Client configuration for the remote music service.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    /// Web API base URL
    pub api_base: String,
    /// Accounts/token endpoint base URL
    pub accounts_base: String,
}

impl From<&RuntimeConfig> for SpotifyConfig {
    fn from(config: &RuntimeConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            api_base: config.api_base.clone(),
            accounts_base: config.accounts_base.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Credentials {
    access_token: String,
    refresh_token: String,
}

/// Remote music service client.
pub struct SpotifyClient {
    http: reqwest::Client,
    config: SpotifyConfig,
    credentials: RwLock<Credentials>,
}

/// Envelope of the artists endpoint; unknown ids come back as nulls.
#[derive(Debug, Deserialize)]
struct ArtistsEnvelope {
    artists: Vec<Option<ArtistDetails>>,
}

impl SpotifyClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Network` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: SpotifyConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        Ok(Self {
            http,
            config,
            credentials: RwLock::new(Credentials::default()),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}{}", self.config.api_base, path))
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let access_token = self.credentials.read().await.access_token.clone();

        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn post_json<T: DeserializeOwned>(&self, url: Url, body: &serde_json::Value) -> Result<T> {
        let access_token = self.credentials.read().await.access_token.clone();

        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    /// POST to the accounts token endpoint with Basic client credentials.
    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenPair> {
        let url = format!("{}/api/token", self.config.accounts_base);
        let body =
            serde_urlencoded::to_string(params).map_err(|e| RemoteError::Parse(e.to_string()))?;
        let basic = STANDARD.encode(format!(
            "{}:{}",
            self.config.client_id, self.config.client_secret
        ));

        let response = self
            .http
            .post(&url)
            .header(AUTHORIZATION, format!("Basic {basic}"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;

        response
            .json::<TokenPair>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }

    /// Map non-success statuses to errors. 429 gets its own variant so the
    /// executor can back off instead of failing the sync.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Remote service rate limited the request");
            return Err(RemoteError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| String::new());
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message: extract_error_message(&body),
            });
        }

        Ok(response)
    }
}

/// Pull the human-readable message out of an API error envelope, falling
/// back to the raw body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|message| message.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl MusicService for SpotifyClient {
    #[instrument(skip(self), fields(limit = query.limit, offset = query.offset))]
    async fn saved_tracks(&self, query: PageQuery) -> Result<SavedTracksPage> {
        let mut url = self.endpoint("/me/tracks")?;
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("offset", &query.offset.to_string());

        let page: SavedTracksPage = self.get_json(url).await?;
        debug!(
            items = page.items.len(),
            total = page.total,
            "Fetched saved-tracks page"
        );

        Ok(page)
    }

    #[instrument(skip(self, artist_ids), fields(count = artist_ids.len()))]
    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<ArtistDetails>> {
        let mut details = Vec::with_capacity(artist_ids.len());

        for chunk in artist_ids.chunks(ARTIST_CHUNK_SIZE) {
            let mut url = self.endpoint("/artists")?;
            url.query_pairs_mut().append_pair("ids", &chunk.join(","));

            let envelope: ArtistsEnvelope = self.get_json(url).await?;
            details.extend(envelope.artists.into_iter().flatten());
        }

        Ok(details)
    }

    #[instrument(skip(self), fields(limit = query.limit, offset = query.offset))]
    async fn playlists(&self, query: PageQuery) -> Result<PlaylistsPage> {
        let mut url = self.endpoint("/me/playlists")?;
        url.query_pairs_mut()
            .append_pair("limit", &query.limit.to_string())
            .append_pair("offset", &query.offset.to_string());

        let page: PlaylistsPage = self.get_json(url).await?;
        debug!(
            items = page.items.len(),
            total = page.total,
            "Fetched playlists page"
        );

        Ok(page)
    }

    #[instrument(skip(self, description))]
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistSummary> {
        let url = self.endpoint("/me/playlists")?;
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "public": public,
        });

        self.post_json(url, &body).await
    }

    #[instrument(skip(self, track_uris), fields(count = track_uris.len()))]
    async fn add_playlist_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()> {
        for chunk in track_uris.chunks(PLAYLIST_ADD_CHUNK_SIZE) {
            let url = self.endpoint(&format!("/playlists/{playlist_id}/tracks"))?;
            let body = serde_json::json!({ "uris": chunk });

            // The response carries only a snapshot id.
            let _: serde_json::Value = self.post_json(url, &body).await?;
        }

        Ok(())
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    #[instrument(skip(self, code))]
    async fn exchange_code(&self, code: &str) -> Result<TokenPair> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_uri),
        ])
        .await
    }

    async fn set_tokens(&self, access_token: &str, refresh_token: &str) {
        let mut credentials = self.credentials.write().await;
        credentials.access_token = access_token.to_string();
        credentials.refresh_token = refresh_token.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_error_message_from_envelope() {
        let body = r#"{"error": {"status": 401, "message": "The access token expired"}}"#;
        assert_eq!(extract_error_message(body), "The access token expired");
    }

    #[test]
    fn test_extract_error_message_falls_back_to_body() {
        assert_eq!(extract_error_message("not json"), "not json");
    }

    #[test]
    fn test_config_from_runtime() {
        let runtime = RuntimeConfig {
            database_path: ":memory:".to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "http://localhost/callback".to_string(),
            api_base: "https://api.example.com/v1".to_string(),
            accounts_base: "https://accounts.example.com".to_string(),
        };

        let config = SpotifyConfig::from(&runtime);
        assert_eq!(config.client_id, "id");
        assert_eq!(config.api_base, "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn test_set_tokens_replaces_state() {
        let client = SpotifyClient::new(SpotifyConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: String::new(),
            api_base: "https://api.example.com/v1".to_string(),
            accounts_base: "https://accounts.example.com".to_string(),
        })
        .unwrap();

        client.set_tokens("access-1", "refresh-1").await;
        {
            let credentials = client.credentials.read().await;
            assert_eq!(credentials.access_token, "access-1");
        }

        client.set_tokens("access-2", "refresh-2").await;
        let credentials = client.credentials.read().await;
        assert_eq!(credentials.access_token, "access-2");
        assert_eq!(credentials.refresh_token, "refresh-2");
    }
}
