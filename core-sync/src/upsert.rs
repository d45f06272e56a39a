//! Entity upsert layer.
//!
//! Turns a batch of saved-track items into idempotent writes: artists,
//! genres and tracks are insert-or-ignore against their uniqueness
//! constraints, liked rows are appended unconditionally. Duplicate
//! suppression is the engine's job, not this layer's.

use crate::error::{Result, SyncError};
use crate::executor::RequestExecutor;
use core_remote::{MusicService, SavedTrackItem};
use core_store::repositories::{
    ArtistRepository, GenreRepository, LikedTrackRepository, TrackRepository,
};
use core_store::StoreError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub struct LikedTrackWriter {
    service: Arc<dyn MusicService>,
    executor: Arc<RequestExecutor>,
    artists: Arc<dyn ArtistRepository>,
    genres: Arc<dyn GenreRepository>,
    tracks: Arc<dyn TrackRepository>,
    liked: Arc<dyn LikedTrackRepository>,
}

impl LikedTrackWriter {
    pub fn new(
        service: Arc<dyn MusicService>,
        executor: Arc<RequestExecutor>,
        artists: Arc<dyn ArtistRepository>,
        genres: Arc<dyn GenreRepository>,
        tracks: Arc<dyn TrackRepository>,
        liked: Arc<dyn LikedTrackRepository>,
    ) -> Self {
        Self {
            service,
            executor,
            artists,
            genres,
            tracks,
            liked,
        }
    }

    /// Persist a batch of saved-track items for a user.
    ///
    /// Fetches artist details (genres included) for the batch's distinct
    /// primary artists in one pass, then writes entities per item. Items
    /// with no listed artist are skipped with a warning.
    #[instrument(skip(self, items), fields(batch = items.len()))]
    pub async fn upsert_batch(
        &self,
        user_id: &str,
        user_row_id: i64,
        items: &[SavedTrackItem],
    ) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut artist_ids: Vec<String> = Vec::new();
        for item in items {
            if let Some(artist) = item.track.primary_artist() {
                if !artist_ids.contains(&artist.id) {
                    artist_ids.push(artist.id.clone());
                }
            }
        }

        let details = self
            .executor
            .execute(user_id, || self.service.artists(&artist_ids))
            .await?;
        let details: HashMap<String, _> = details
            .into_iter()
            .map(|artist| (artist.id.clone(), artist))
            .collect();

        for item in items {
            let Some(artist_ref) = item.track.primary_artist() else {
                warn!(track_id = %item.track.id, "Skipping item with no listed artist");
                continue;
            };

            // Prefer the detailed lookup, fall back to the embedded reference
            let (artist_name, genres) = match details.get(&artist_ref.id) {
                Some(artist) => (artist.name.as_str(), artist.genres.as_slice()),
                None => (artist_ref.name.as_str(), &[][..]),
            };

            self.artists.insert_or_ignore(&artist_ref.id, artist_name).await?;
            let artist_row_id = self
                .artists
                .id_for(&artist_ref.id)
                .await?
                .ok_or_else(|| missing("Artist", &artist_ref.id))?;

            for genre in genres {
                self.genres.insert_or_ignore(genre).await?;
                let genre_row_id = self
                    .genres
                    .id_for(genre)
                    .await?
                    .ok_or_else(|| missing("Genre", genre))?;
                self.genres.link_artist(artist_row_id, genre_row_id).await?;
            }

            self.tracks
                .insert_or_ignore(&item.track.id, &item.track.name, artist_row_id)
                .await?;
            let track_row_id = self
                .tracks
                .id_for(&item.track.id)
                .await?
                .ok_or_else(|| missing("Track", &item.track.id))?;

            self.liked
                .insert(user_row_id, track_row_id, item.added_at.timestamp())
                .await?;
        }

        debug!(batch = items.len(), "Upserted saved-track batch");
        Ok(())
    }
}

fn missing(entity: &'static str, id: &str) -> SyncError {
    SyncError::Store(StoreError::NotFound {
        entity,
        id: id.to_string(),
    })
}
