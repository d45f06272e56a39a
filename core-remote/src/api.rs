//! Remote music service interface

use crate::error::Result;
use crate::types::{
    ArtistDetails, PageQuery, PlaylistSummary, PlaylistsPage, SavedTracksPage, TokenPair,
};
use async_trait::async_trait;

/// Object-safe view of the remote music service.
///
/// The sync engine and token manager depend on this trait so they can be
/// tested against fakes; [`crate::client::SpotifyClient`] is the production
/// implementation.
#[async_trait]
pub trait MusicService: Send + Sync {
    /// Fetch one page of the user's saved tracks, most recently liked first.
    ///
    /// `SavedTracksPage::total` is the library size at the time of the call;
    /// it can change between calls.
    async fn saved_tracks(&self, query: PageQuery) -> Result<SavedTracksPage>;

    /// Fetch full details for a set of artists. Accepts any number of ids;
    /// requests are issued in chunks of at most 50.
    async fn artists(&self, artist_ids: &[String]) -> Result<Vec<ArtistDetails>>;

    /// Fetch one page of the current user's playlists.
    async fn playlists(&self, query: PageQuery) -> Result<PlaylistsPage>;

    /// Create a playlist owned by the current user.
    async fn create_playlist(
        &self,
        name: &str,
        description: &str,
        public: bool,
    ) -> Result<PlaylistSummary>;

    /// Append tracks to a playlist. Accepts any number of URIs; requests
    /// are issued in chunks of at most 50.
    async fn add_playlist_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()>;

    /// Exchange a refresh token for a new access token.
    ///
    /// The response may omit the refresh token, in which case the old one
    /// stays valid.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair>;

    /// Exchange an authorization code for an initial credential pair.
    async fn exchange_code(&self, code: &str) -> Result<TokenPair>;

    /// Apply a credential pair to outgoing request state.
    async fn set_tokens(&self, access_token: &str, refresh_token: &str);
}
