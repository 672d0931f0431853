use super::display::{TagInfo, display_from_fields};
use super::model::{Album, AlbumId, Track, TrackId};
use crate::config::TrackDisplayField;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn display_from_fields_can_format_artist_title() {
    let p = Path::new("/tmp/Song.mp3");
    let fields = [TrackDisplayField::Artist, TrackDisplayField::Title];

    let tags = TagInfo {
        title: "Song",
        artist: Some("Artist"),
        ..TagInfo::default()
    };
    assert_eq!(display_from_fields(p, &tags, &fields, " - "), "Artist - Song");

    let tags = TagInfo {
        title: "Song",
        artist: Some("  Artist  "),
        ..TagInfo::default()
    };
    assert_eq!(display_from_fields(p, &tags, &fields, " - "), "Artist - Song");

    let tags = TagInfo {
        title: "Song",
        ..TagInfo::default()
    };
    assert_eq!(display_from_fields(p, &tags, &fields, " - "), "Song");
}

#[test]
fn display_from_fields_pads_track_numbers() {
    let p = Path::new("/tmp/x/Song.mp3");
    let tags = TagInfo {
        title: "Song",
        number: Some(3),
        ..TagInfo::default()
    };
    assert_eq!(
        display_from_fields(
            p,
            &tags,
            &[TrackDisplayField::Number, TrackDisplayField::Filename],
            ". ",
        ),
        "03. Song"
    );
}

#[test]
fn album_total_duration_skips_unknown_lengths() {
    let track = |id: usize, secs: Option<u64>| Track {
        id: TrackId(id),
        title: format!("t{id}"),
        artist: None,
        number: None,
        duration: secs.map(Duration::from_secs),
        source: PathBuf::from(format!("/music/{id}.mp3")),
        album: AlbumId(0),
        display: format!("t{id}"),
    };
    let album = Album {
        id: AlbumId(0),
        title: "A".into(),
        artist: "B".into(),
        cover: None,
        tracks: vec![track(0, Some(60)), track(1, None), track(2, Some(30))],
    };
    assert_eq!(album.total_duration(), Duration::from_secs(90));
    assert_eq!(album.position_of(TrackId(2)), Some(2));
    assert_eq!(album.position_of(TrackId(9)), None);
}
