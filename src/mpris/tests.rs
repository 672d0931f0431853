use super::*;
use crate::library::{AlbumId, TrackId};
use std::path::PathBuf;

fn make_track() -> Track {
    Track {
        id: TrackId(7),
        title: "Test Title".to_string(),
        artist: Some("Test Artist".to_string()),
        number: Some(3),
        duration: Some(Duration::from_micros(1_234_567)),
        source: PathBuf::from("/tmp/music/test.mp3"),
        album: AlbumId(0),
        display: "03 - Test Title".to_string(),
    }
}

fn handle() -> (MprisHandle, Arc<Mutex<SharedState>>, Receiver<()>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
    };
    (handle, state, notify_rx)
}

fn iface(state: &Arc<Mutex<SharedState>>) -> PlayerIface {
    let (tx, _rx) = mpsc::channel::<ControlCmd>();
    PlayerIface {
        tx,
        state: state.clone(),
    }
}

#[test]
fn set_track_metadata_sets_and_clears_shared_state() {
    let (handle, state, _notify) = handle();

    let track = make_track();
    handle.set_track_metadata(Some(&track), Some("Test Album"));

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.artist, vec!["Test Artist".to_string()]);
        assert_eq!(s.album.as_deref(), Some("Test Album"));
        assert!(s.url.as_deref().unwrap().contains("/tmp/music/test.mp3"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str()),
            Some("/org/mpris/MediaPlayer2/track/7")
        );
    }

    handle.set_track_metadata(None, None);
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert!(s.artist.is_empty());
        assert_eq!(s.album, None);
        assert_eq!(s.url, None);
        assert_eq!(s.length_micros, None);
        assert!(s.track_id.is_none());
    }
}

#[test]
fn every_update_nudges_the_server() {
    let (handle, _state, notify) = handle();
    handle.set_playback(TransportState::Playing);
    handle.set_options(0.5, false, true, RepeatMode::All);

    assert_eq!(notify.try_iter().count(), 2);
}

#[test]
fn playback_status_maps_transport_state() {
    let (_handle, state, _notify) = handle();
    let iface = iface(&state);

    assert_eq!(iface.playback_status(), "Stopped");
    state.lock().unwrap().playback = TransportState::Playing;
    assert_eq!(iface.playback_status(), "Playing");
    state.lock().unwrap().playback = TransportState::Paused;
    assert_eq!(iface.playback_status(), "Paused");
}

#[test]
fn options_map_to_player_properties() {
    let (handle, state, _notify) = handle();
    let iface = iface(&state);

    handle.set_options(0.25, false, true, RepeatMode::One);
    assert_eq!(iface.volume(), 0.25);
    assert!(iface.shuffle());
    assert_eq!(iface.loop_status(), "Track");

    handle.set_options(0.25, true, false, RepeatMode::All);
    assert_eq!(iface.volume(), 0.0);
    assert!(!iface.shuffle());
    assert_eq!(iface.loop_status(), "Playlist");

    handle.set_options(1.0, false, false, RepeatMode::Off);
    assert_eq!(iface.loop_status(), "None");
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let (handle, state, _notify) = handle();
    let iface = iface(&state);

    assert!(iface.metadata().is_empty());

    handle.set_track_metadata(Some(&make_track()), Some("Album"));
    let map = iface.metadata();
    for k in [
        "mpris:trackid",
        "xesam:title",
        "xesam:artist",
        "xesam:album",
        "xesam:url",
        "mpris:length",
    ] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}
