//! Row types for the mirror schema.
//!
//! All timestamps are stored as unix seconds (`i64`); conversion to and from
//! RFC 3339 happens at the remote boundary.

use sqlx::FromRow;

/// A registered account with its current token state.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    /// Surrogate primary key
    pub id: i64,
    /// Remote account identifier (unique)
    pub user_id: String,
    /// Current OAuth access token
    pub access_token: String,
    /// Long-lived refresh token
    pub refresh_token: String,
    /// Unix second at which the access token expires
    pub expires_at: i64,
    /// Derived API secret handed to local callers
    pub api_token: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl User {
    /// Whether the access token has expired at `now` (unix seconds).
    ///
    /// The boundary is inclusive: a token expiring exactly now is stale.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// A deduplicated artist entity.
#[derive(Debug, Clone, FromRow)]
pub struct Artist {
    pub id: i64,
    /// Remote artist identifier (unique)
    pub artist_id: String,
    pub name: String,
}

/// A deduplicated track entity with its primary artist.
#[derive(Debug, Clone, FromRow)]
pub struct Track {
    pub id: i64,
    /// Remote track identifier (unique)
    pub track_id: String,
    pub name: String,
    /// Row id of the primary artist
    pub artist_id: i64,
}

/// One liked-track fact for one user.
#[derive(Debug, Clone, FromRow)]
pub struct LikedTrack {
    pub id: i64,
    /// Row id of the owning user
    pub user_id: i64,
    /// Row id of the liked track
    pub track_id: i64,
    /// Unix second the track was liked remotely
    pub added_at: i64,
    /// Year component of `added_at`, denormalized for reporting
    pub year: i32,
    /// Month component of `added_at` (1-12), denormalized for reporting
    pub month: i32,
}

/// A liked row joined with its track, as seen in library order
/// (most recently liked first). Used for positional comparison against
/// remote pages.
#[derive(Debug, Clone, FromRow)]
pub struct LikedEntry {
    /// Row id of the liked_tracks row
    pub liked_id: i64,
    /// Row id of the tracks row
    pub track_row_id: i64,
    /// Remote track identifier
    pub track_id: String,
    /// Track name
    pub name: String,
    /// Unix second the track was liked remotely
    pub added_at: i64,
}

/// Aggregated count of likes for one year.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

/// Aggregated count of likes for one month of a year.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct MonthCount {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_is_inclusive() {
        let user = User {
            id: 1,
            user_id: "u".to_string(),
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: 1_700_000_000,
            api_token: "t".to_string(),
            created_at: 0,
            updated_at: 0,
        };

        assert!(!user.is_expired(1_699_999_999));
        assert!(user.is_expired(1_700_000_000));
        assert!(user.is_expired(1_700_000_001));
    }
}
