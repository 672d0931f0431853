use std::path::Path;

use crate::config::TrackDisplayField;

/// Tag values read for one file, before the track is assigned to an album.
#[derive(Debug, Default, Clone)]
pub struct TagInfo<'a> {
    pub title: &'a str,
    pub artist: Option<&'a str>,
    pub album: Option<&'a str>,
    pub number: Option<u32>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Build the label shown for a track from the configured `fields`, joined by `sep`.
///
/// Falls back to the title when none of the requested fields produced text.
pub fn display_from_fields(
    path: &Path,
    tags: &TagInfo<'_>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Number => {
                if let Some(n) = tags.number {
                    parts.push(format!("{n:02}"));
                }
            }
            TrackDisplayField::Title => {
                if let Some(t) = non_empty(Some(tags.title)) {
                    parts.push(t.to_string());
                }
            }
            TrackDisplayField::Artist => {
                if let Some(a) = non_empty(tags.artist) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = non_empty(tags.album) {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                if let Some(stem) = non_empty(path.file_stem().and_then(|s| s.to_str())) {
                    parts.push(stem.to_string());
                }
            }
            TrackDisplayField::Path => {
                parts.push(path.display().to_string());
            }
        }
    }

    if parts.is_empty() {
        tags.title.to_string()
    } else {
        parts.join(sep)
    }
}
