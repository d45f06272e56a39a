//! Month-playlist assembly.
//!
//! Turns the mirrored liked rows into one remote playlist per calendar
//! month of liking, named `Liked Songs from {Mon} {Year}`. A month whose
//! playlist already exists (matched by name) is skipped, so repeated runs
//! only create what is missing.
//!
//! Track membership comes from the local mirror, not the remote library:
//! the year/month columns on liked rows select the month's tracks, which
//! keeps the builder cheap and consistent with whatever the last
//! reconciliation saw.

use crate::error::{Result, SyncError};
use crate::executor::RequestExecutor;
use crate::progress::{ProgressSink, Severity};
use crate::reconciler::PAGE_SIZE;
use core_remote::{MusicService, PageQuery, PlaylistSummary};
use core_store::repositories::{LikedTrackRepository, UserRepository};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Playlist track URIs are the remote track id under this scheme.
const TRACK_URI_PREFIX: &str = "spotify:track:";

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Display name for one month's playlist.
///
/// Months are stored 1-12; anything else falls back to the raw number so a
/// bad row cannot panic the builder.
pub fn month_playlist_name(year: i32, month: i32) -> String {
    match usize::try_from(month)
        .ok()
        .and_then(|m| MONTH_NAMES.get(m.wrapping_sub(1)))
    {
        Some(name) => format!("Liked Songs from {name} {year}"),
        None => format!("Liked Songs from {month} {year}"),
    }
}

pub struct PlaylistBuilder {
    service: Arc<dyn MusicService>,
    executor: Arc<RequestExecutor>,
    users: Arc<dyn UserRepository>,
    liked: Arc<dyn LikedTrackRepository>,
}

impl PlaylistBuilder {
    pub fn new(
        service: Arc<dyn MusicService>,
        executor: Arc<RequestExecutor>,
        users: Arc<dyn UserRepository>,
        liked: Arc<dyn LikedTrackRepository>,
    ) -> Self {
        Self {
            service,
            executor,
            users,
            liked,
        }
    }

    /// Create a playlist for every (year, month) the user has likes in.
    ///
    /// Safe to re-run: months whose playlist name already exists remotely
    /// are skipped.
    #[instrument(skip(self, progress))]
    pub async fn build_month_playlists(
        &self,
        user_id: &str,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let user = self
            .users
            .find_by_remote_id(user_id)
            .await?
            .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;
        let user_row_id = user.id;

        for year in self.liked.liked_years(user_row_id).await? {
            for month in self
                .liked
                .liked_months(user_row_id, Some(year.year))
                .await?
            {
                self.build_month_playlist(user_id, user_row_id, month.year, month.month, progress)
                    .await?;
            }
        }

        progress.report("Month playlists up to date", Severity::Info);
        info!(user_id, "Month playlists up to date");
        Ok(())
    }

    async fn build_month_playlist(
        &self,
        user_id: &str,
        user_row_id: i64,
        year: i32,
        month: i32,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let name = month_playlist_name(year, month);

        if self.find_by_name(user_id, &name).await?.is_some() {
            debug!(name, "Playlist already exists, skipping");
            progress.report(&format!("Playlist already exists: {name}"), Severity::Info);
            return Ok(());
        }

        let track_ids = self
            .liked
            .remote_ids_for_month(user_row_id, year, month)
            .await?;

        let playlist = self
            .executor
            .execute(user_id, || self.service.create_playlist(&name, "", false))
            .await?;
        progress.report(&format!("Created playlist: {name}"), Severity::Info);

        if track_ids.is_empty() {
            return Ok(());
        }

        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("{TRACK_URI_PREFIX}{id}"))
            .collect();

        // A created-but-empty playlist is recoverable by hand; failing the
        // whole run over it is not worth it.
        match self
            .executor
            .execute(user_id, || {
                self.service.add_playlist_tracks(&playlist.id, &uris)
            })
            .await
        {
            Ok(()) => {
                progress.report(
                    &format!("Added {} tracks to {name}", uris.len()),
                    Severity::Info,
                );
            }
            Err(error) => {
                warn!(name, error = %error, "Failed to add tracks to playlist");
                progress.report(
                    &format!("Failed to add tracks to {name}: {error}"),
                    Severity::Warn,
                );
            }
        }

        Ok(())
    }

    /// Page through the user's playlists looking for an exact name match.
    async fn find_by_name(&self, user_id: &str, name: &str) -> Result<Option<PlaylistSummary>> {
        let mut offset = 0u32;

        loop {
            let page = self
                .executor
                .execute(user_id, || {
                    self.service.playlists(PageQuery::new(PAGE_SIZE, offset))
                })
                .await?;

            if let Some(found) = page.items.iter().find(|playlist| playlist.name == name) {
                return Ok(Some(found.clone()));
            }

            offset += page.items.len() as u32;
            if page.items.is_empty() || offset >= page.total {
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_playlist_name() {
        assert_eq!(month_playlist_name(2023, 6), "Liked Songs from Jun 2023");
        assert_eq!(month_playlist_name(2024, 1), "Liked Songs from Jan 2024");
        assert_eq!(month_playlist_name(2024, 12), "Liked Songs from Dec 2024");
    }

    #[test]
    fn test_month_playlist_name_out_of_range_falls_back() {
        assert_eq!(month_playlist_name(2024, 0), "Liked Songs from 0 2024");
        assert_eq!(month_playlist_name(2024, 13), "Liked Songs from 13 2024");
    }
}
