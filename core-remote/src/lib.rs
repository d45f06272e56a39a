//! # Remote Music Service Boundary
//!
//! Wire types, the [`MusicService`] trait and the production
//! [`SpotifyClient`]. Everything above this crate talks to the remote
//! service through the trait and matches on [`RemoteError`] variants.

pub mod api;
pub mod client;
pub mod error;
pub mod types;

pub use api::MusicService;
pub use client::{SpotifyClient, SpotifyConfig};
pub use error::{RemoteError, Result};
pub use types::{
    ArtistDetails, ArtistRef, PageQuery, PlaylistSummary, PlaylistsPage, SavedTrackItem,
    SavedTracksPage, TokenPair, TrackObject,
};
