use super::models::SongMatch;

/// The resolution join: matches a play event to a loaded song and its artist.
///
/// A match requires the song title, the artist name and the song duration to
/// be exactly equal to the given values. Floating-point durations are compared
/// with plain equality, no tolerance.
pub trait SongLookup {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> rusqlite::Result<Option<SongMatch>>;
}
