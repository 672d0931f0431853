use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::{TagInfo, display_from_fields};
use super::model::{Album, AlbumId, Track, TrackId};

const UNKNOWN_ARTIST: &str = "Unknown Artist";
const COVER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// A file that passed the filters, before album grouping.
struct Scanned {
    path: PathBuf,
    title: String,
    artist: Option<String>,
    album: String,
    number: Option<u32>,
    duration: Option<Duration>,
    display: String,
}

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Album name for untagged files: the containing directory.
fn album_from_dir(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or("Unknown Album")
        .to_string()
}

/// Look for a cover image next to `track_path`, e.g. `cover.jpg` or `Folder.png`.
pub(super) fn find_cover(track_path: &Path, names: &[String]) -> Option<PathBuf> {
    let dir = track_path.parent()?;
    let mut found: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .filter(|p| {
            let stem = p
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_ascii_lowercase);
            let ext = p
                .extension()
                .and_then(|s| s.to_str())
                .map(str::to_ascii_lowercase);
            match (stem, ext) {
                (Some(stem), Some(ext)) => {
                    names.iter().any(|n| n.eq_ignore_ascii_case(&stem))
                        && COVER_EXTENSIONS.contains(&ext.as_str())
                }
                _ => false,
            }
        })
        .collect();
    // Prefer the earliest configured name.
    found.sort_by_key(|p| {
        let stem = p
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        names
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&stem))
            .unwrap_or(usize::MAX)
    });
    found.into_iter().next()
}

fn read_file(path: &Path, settings: &LibrarySettings) -> Scanned {
    let mut title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let mut artist: Option<String> = None;
    let mut album: Option<String> = None;
    let mut number: Option<u32> = None;
    let mut duration: Option<Duration> = None;

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            duration = Some(tagged.properties().duration());

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title() {
                    if !v.trim().is_empty() {
                        title = v.trim().to_string();
                    }
                }
                artist = tag
                    .artist()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                album = tag
                    .album()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                number = tag.track();
            }
        }
        Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    let album = album.unwrap_or_else(|| album_from_dir(path));
    let display = display_from_fields(
        path,
        &TagInfo {
            title: &title,
            artist: artist.as_deref(),
            album: Some(&album),
            number,
        },
        &settings.display_fields,
        &settings.display_separator,
    );

    Scanned {
        path: path.to_path_buf(),
        title,
        artist,
        album,
        number,
        duration,
        display,
    }
}

/// Walk `dir` and group every audio file into albums.
///
/// Albums are keyed by their album tag (or directory name when untagged) and
/// ordered by artist then title; tracks are ordered by track number, then label.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Album> {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut grouped: BTreeMap<String, Vec<Scanned>> = BTreeMap::new();
    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if path.is_file()
            && (settings.include_hidden || !is_hidden(path))
            && is_audio_file(path, settings)
        {
            let scanned = read_file(path, settings);
            grouped.entry(scanned.album.clone()).or_default().push(scanned);
        }
    }

    let mut albums: Vec<Album> = grouped
        .into_iter()
        .map(|(title, mut files)| {
            files.sort_by(|a, b| {
                a.number
                    .unwrap_or(u32::MAX)
                    .cmp(&b.number.unwrap_or(u32::MAX))
                    .then_with(|| a.display.to_lowercase().cmp(&b.display.to_lowercase()))
            });
            let artist = files
                .iter()
                .find_map(|f| f.artist.clone())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
            let cover = files
                .first()
                .and_then(|f| find_cover(&f.path, &settings.cover_names));
            let tracks = files
                .into_iter()
                .map(|f| Track {
                    id: TrackId(0),
                    title: f.title,
                    artist: f.artist,
                    number: f.number,
                    duration: f.duration,
                    source: f.path,
                    album: AlbumId(0),
                    display: f.display,
                })
                .collect();
            Album {
                id: AlbumId(0),
                title,
                artist,
                cover,
                tracks,
            }
        })
        .collect();

    albums.sort_by(|a, b| {
        a.artist
            .to_lowercase()
            .cmp(&b.artist.to_lowercase())
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
    });

    // Ids follow the final ordering so they stay stable for a given directory.
    let mut next_track = 0;
    for (ai, album) in albums.iter_mut().enumerate() {
        album.id = AlbumId(ai);
        for track in &mut album.tracks {
            track.id = TrackId(next_track);
            track.album = album.id;
            next_track += 1;
        }
    }

    info!(
        dir = %dir.display(),
        albums = albums.len(),
        tracks = next_track,
        "library scanned"
    );
    albums
}
