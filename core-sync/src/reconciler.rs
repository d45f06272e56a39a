//! Library reconciliation engine.
//!
//! Drives the local mirror toward the remote library in four strictly
//! ordered phases, each re-deriving its state from current counts so a run
//! can always be repeated from scratch:
//!
//! 0. collapse leftover duplicate liked rows so counts are trustworthy;
//! 1. shrinkage: remove local rows the remote no longer has;
//! 2. forward fill from the top, stopping at the first already-known item;
//! 3. tail catch-up from `offset = local_count` if the counts still differ;
//! 4. a final duplicate collapse if the local count overshot the total.
//!
//! The remote library can change between calls; nothing here assumes two
//! page fetches agree with each other.

use crate::error::{Result, SyncError};
use crate::executor::RequestExecutor;
use crate::progress::{ProgressSink, Severity};
use crate::upsert::LikedTrackWriter;
use core_remote::{MusicService, PageQuery};
use core_store::models::LikedEntry;
use core_store::repositories::{LikedTrackRepository, TrackRepository, UserRepository};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Saved-tracks page size used throughout reconciliation.
pub const PAGE_SIZE: u32 = 50;

pub struct ReconcileEngine {
    service: Arc<dyn MusicService>,
    executor: Arc<RequestExecutor>,
    users: Arc<dyn UserRepository>,
    tracks: Arc<dyn TrackRepository>,
    liked: Arc<dyn LikedTrackRepository>,
    writer: LikedTrackWriter,
}

impl ReconcileEngine {
    pub fn new(
        service: Arc<dyn MusicService>,
        executor: Arc<RequestExecutor>,
        users: Arc<dyn UserRepository>,
        tracks: Arc<dyn TrackRepository>,
        liked: Arc<dyn LikedTrackRepository>,
        writer: LikedTrackWriter,
    ) -> Self {
        Self {
            service,
            executor,
            users,
            tracks,
            liked,
            writer,
        }
    }

    /// Reconcile one user's mirror against the remote library.
    ///
    /// Safe to re-run at any time; a second run over a converged mirror is
    /// a no-op apart from the probes.
    #[instrument(skip(self, progress))]
    pub async fn reconcile(&self, user_id: &str, progress: &dyn ProgressSink) -> Result<()> {
        let user = self
            .users
            .find_by_remote_id(user_id)
            .await?
            .ok_or_else(|| SyncError::UserNotFound(user_id.to_string()))?;
        let user_row_id = user.id;

        // Phase 0: stale duplicates would skew every count below
        let collapsed = self.collapse_duplicates(user_row_id).await?;
        if collapsed > 0 {
            progress.report(
                &format!("Removed {collapsed} leftover duplicate liked rows"),
                Severity::Warn,
            );
        }

        let remote_total = self.probe_total(user_id).await?;
        let local_count = self.liked.count_for_user(user_row_id).await? as u32;
        progress.report(
            &format!("Remote library has {remote_total} tracks, local mirror has {local_count}"),
            Severity::Info,
        );

        if remote_total < local_count {
            self.remove_missing(user_id, user_row_id, remote_total, progress)
                .await?;
        }

        self.forward_fill(user_id, user_row_id, progress).await?;
        self.tail_catch_up(user_id, user_row_id, progress).await?;

        // Phase 4: tail catch-up inserts unconditionally, so an overshoot
        // means duplicates crept in during the run
        let remote_total = self.probe_total(user_id).await?;
        let local_count = self.liked.count_for_user(user_row_id).await? as u32;
        if local_count > remote_total {
            let collapsed = self.collapse_duplicates(user_row_id).await?;
            progress.report(
                &format!("Collapsed {collapsed} duplicate liked rows"),
                Severity::Warn,
            );
        }

        progress.report("Reconciliation complete", Severity::Info);
        info!(user_id, "Reconciliation complete");
        Ok(())
    }

    /// Read the remote library size with a 1-item probe.
    async fn probe_total(&self, user_id: &str) -> Result<u32> {
        let page = self
            .executor
            .execute(user_id, || self.service.saved_tracks(PageQuery::probe()))
            .await?;
        Ok(page.total)
    }

    /// Collapse duplicate (user, track) groups, keeping the earliest-added
    /// row of each. Returns the number of rows removed.
    async fn collapse_duplicates(&self, user_row_id: i64) -> Result<u64> {
        let mut removed = 0;

        for track_row_id in self.liked.duplicate_track_ids(user_row_id).await? {
            let rows = self.liked.rows_for_track(user_row_id, track_row_id).await?;
            let extras: Vec<i64> = rows.iter().skip(1).map(|row| row.id).collect();
            removed += self.liked.delete_rows(&extras).await?;
        }

        if removed > 0 {
            debug!(user_row_id, removed, "Collapsed duplicate liked rows");
        }
        Ok(removed)
    }

    /// Phase 1: the remote library shrank. Walk local rows in remote order
    /// page by page; a position mismatch means the local row was unliked,
    /// so delete it, re-read the page and compare the same position again.
    /// Rows past the remote total cannot match any position and go last.
    async fn remove_missing(
        &self,
        user_id: &str,
        user_row_id: i64,
        remote_total: u32,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        progress.report("Remote library shrank, removing unliked tracks", Severity::Info);

        let mut offset = 0u32;
        while offset < remote_total {
            let local_count = self.liked.count_for_user(user_row_id).await? as u32;
            if local_count <= remote_total {
                break;
            }

            let remote = self
                .executor
                .execute(user_id, || {
                    self.service.saved_tracks(PageQuery::new(PAGE_SIZE, offset))
                })
                .await?;
            if remote.items.is_empty() {
                break;
            }

            let mut local_page = self.local_page(user_row_id, offset).await?;
            let mut position = 0usize;
            while position < remote.items.len() {
                let Some(entry) = local_page.get(position) else {
                    break;
                };

                if entry.track_id == remote.items[position].track.id {
                    position += 1;
                    continue;
                }

                debug!(track_id = %entry.track_id, "Local row absent remotely, deleting");
                self.delete_entry(user_row_id, entry).await?;
                // Rows below shifted up one position; compare it again
                local_page = self.local_page(user_row_id, offset).await?;
            }

            offset += PAGE_SIZE;
        }

        // Trailing rows beyond the remote total
        loop {
            let local_count = self.liked.count_for_user(user_row_id).await? as u32;
            if local_count <= remote_total {
                break;
            }

            let extras = self
                .liked
                .page_in_remote_order(
                    user_row_id,
                    (local_count - remote_total) as i64,
                    remote_total as i64,
                )
                .await?;
            if extras.is_empty() {
                break;
            }

            for entry in &extras {
                debug!(track_id = %entry.track_id, "Removing trailing local row");
                self.delete_entry(user_row_id, entry).await?;
            }
        }

        Ok(())
    }

    async fn local_page(&self, user_row_id: i64, offset: u32) -> Result<Vec<LikedEntry>> {
        Ok(self
            .liked
            .page_in_remote_order(user_row_id, PAGE_SIZE as i64, offset as i64)
            .await?)
    }

    /// Delete every liked row for the (user, track) pair, then the track
    /// row itself. Duplicates were collapsed in phase 0, so no other liked
    /// row still references the track.
    async fn delete_entry(&self, user_row_id: i64, entry: &LikedEntry) -> Result<()> {
        self.liked
            .delete_for_track(user_row_id, entry.track_row_id)
            .await?;
        self.tracks.delete_by_id(entry.track_row_id).await?;
        Ok(())
    }

    /// Phase 2: insert new items from the top of the library, stopping at
    /// the first item that is already mirrored.
    async fn forward_fill(
        &self,
        user_id: &str,
        user_row_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let mut known: HashSet<String> = self
            .liked
            .remote_ids_for_user(user_row_id)
            .await?
            .into_iter()
            .collect();

        let mut offset = 0u32;
        let mut inserted = 0usize;

        loop {
            let page = self
                .executor
                .execute(user_id, || {
                    self.service.saved_tracks(PageQuery::new(PAGE_SIZE, offset))
                })
                .await?;
            if page.items.is_empty() {
                break;
            }

            let mut batch = Vec::new();
            let mut hit_known = false;
            for item in &page.items {
                if known.contains(&item.track.id) {
                    hit_known = true;
                    break;
                }
                batch.push(item.clone());
            }

            if !batch.is_empty() {
                self.writer.upsert_batch(user_id, user_row_id, &batch).await?;
                known.extend(batch.iter().map(|item| item.track.id.clone()));
                inserted += batch.len();
                progress.report(
                    &format!("Saved {inserted} newly liked tracks"),
                    Severity::Info,
                );
            }

            if hit_known {
                break;
            }

            offset += PAGE_SIZE;
            if offset >= page.total {
                break;
            }
        }

        Ok(())
    }

    /// Phase 3: the forward fill stops at the first known item, which
    /// misses older items a fresh mirror never saw. Re-probe and insert
    /// unconditionally from the end of the local mirror.
    async fn tail_catch_up(
        &self,
        user_id: &str,
        user_row_id: i64,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let remote_total = self.probe_total(user_id).await?;
        let local_count = self.liked.count_for_user(user_row_id).await? as u32;

        if local_count >= remote_total {
            return Ok(());
        }

        progress.report(
            &format!("Catching up {} older tracks", remote_total - local_count),
            Severity::Info,
        );

        let mut offset = local_count;
        while offset < remote_total {
            let page = self
                .executor
                .execute(user_id, || {
                    self.service.saved_tracks(PageQuery::new(PAGE_SIZE, offset))
                })
                .await?;
            if page.items.is_empty() {
                break;
            }

            self.writer
                .upsert_batch(user_id, user_row_id, &page.items)
                .await?;
            offset += page.items.len() as u32;
        }

        Ok(())
    }
}
