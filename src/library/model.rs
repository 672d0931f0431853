use std::path::PathBuf;
use std::time::Duration;

/// Stable identifier assigned to a track by the scanner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub usize);

/// Stable identifier assigned to an album by the scanner.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlbumId(pub usize);

/// A playable track. Immutable once the library has been scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: Option<String>,
    /// Position on the album, when tagged.
    pub number: Option<u32>,
    pub duration: Option<Duration>,
    /// Location of the audio data.
    pub source: PathBuf,
    /// Owning album.
    pub album: AlbumId,
    pub display: String,
}

/// An album and its tracks in playback order.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    pub cover: Option<PathBuf>,
    pub tracks: Vec<Track>,
}

impl Album {
    /// Sum of the known track durations.
    pub fn total_duration(&self) -> Duration {
        self.tracks.iter().filter_map(|t| t.duration).sum()
    }

    pub fn position_of(&self, id: TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == id)
    }
}
