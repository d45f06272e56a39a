//! Wire types for the remote music service.
//!
//! Shapes mirror the Web API payloads; only the fields the mirror consumes
//! are declared, everything else is ignored during deserialization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One page worth of saved-tracks query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Page size, 1..=50
    pub limit: u32,
    /// Zero-based item offset into the library
    pub offset: u32,
}

impl PageQuery {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Minimal query used to read the library size without paying for a
    /// full page.
    pub fn probe() -> Self {
        Self {
            limit: 1,
            offset: 0,
        }
    }
}

/// A page of the user's saved tracks, most recently liked first.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTracksPage {
    pub items: Vec<SavedTrackItem>,
    /// Library size at the time of the call
    pub total: u32,
}

/// One saved track with the instant it was liked.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrackItem {
    pub added_at: DateTime<Utc>,
    pub track: TrackObject,
}

/// Track payload within a saved-tracks page.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    pub id: String,
    pub name: String,
    pub artists: Vec<ArtistRef>,
}

impl TrackObject {
    /// The first-listed artist is treated as the owning artist.
    pub fn primary_artist(&self) -> Option<&ArtistRef> {
        self.artists.first()
    }
}

/// Minimal artist reference embedded in track payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub id: String,
    pub name: String,
}

/// Full artist details from the artists endpoint, including genres.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistDetails {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

/// A page of the user's playlists.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistsPage {
    pub items: Vec<PlaylistSummary>,
    /// Playlist count at the time of the call
    pub total: u32,
}

/// Minimal playlist payload: enough to find one by name and add tracks.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
}

/// Credential pair returned by the token endpoint.
///
/// A missing refresh token means the previously stored one stays valid.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
}
