//! Repository traits and their SQLite implementations.
//!
//! Each entity gets a trait so the sync and auth layers can be tested
//! against fakes; the `Sqlite*` types are the production implementations.

pub mod artist;
pub mod genre;
pub mod liked_track;
pub mod track;
pub mod user;

pub use artist::{ArtistRepository, SqliteArtistRepository};
pub use genre::{GenreRepository, SqliteGenreRepository};
pub use liked_track::{LikedTrackRepository, SqliteLikedTrackRepository};
pub use track::{SqliteTrackRepository, TrackRepository};
pub use user::{NewCredentials, SqliteUserRepository, TokenUpdate, UserRepository};
