//! MPRIS service so desktop media keys and `playerctl` can drive the player.
//!
//! The D-Bus server runs on its own thread. Commands flow back to the event
//! loop over an `mpsc` channel; state flows out through a mutex-guarded
//! snapshot, and each update nudges the thread to emit `PropertiesChanged`.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, info, warn};
use zbus::{Connection, interface};
use zvariant::{OwnedObjectPath, OwnedValue, Value};

use crate::audio::{RepeatMode, TransportState};
use crate::library::Track;

const BUS_NAME: &str = "org.mpris.MediaPlayer2.encore";
const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NOTIFY_POLL: Duration = Duration::from_millis(200);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
}

#[derive(Debug)]
struct SharedState {
    playback: TransportState,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    volume: f64,
    shuffle: bool,
    repeat: RepeatMode,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            playback: TransportState::Idle,
            title: None,
            artist: Vec::new(),
            album: None,
            url: None,
            length_micros: None,
            track_id: None,
            volume: 1.0,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    fn update(&self, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
        // The server may be gone (no session bus); nothing to tell then.
        let _ = self.notify.send(());
    }

    pub fn set_playback(&self, playback: TransportState) {
        self.update(|s| s.playback = playback);
    }

    pub fn set_track_metadata(&self, track: Option<&Track>, album: Option<&str>) {
        self.update(|s| match track {
            Some(t) => {
                s.title = Some(t.title.clone());
                s.artist = t.artist.iter().cloned().collect();
                s.album = album.map(str::to_string);
                s.url = Some(format!("file://{}", t.source.display()));
                s.length_micros = t
                    .duration
                    .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX));
                s.track_id =
                    OwnedObjectPath::try_from(format!("{OBJECT_PATH}/track/{}", t.id.0)).ok();
            }
            None => {
                s.title = None;
                s.artist.clear();
                s.album = None;
                s.url = None;
                s.length_micros = None;
                s.track_id = None;
            }
        });
    }

    pub fn set_options(&self, volume: f32, muted: bool, shuffle: bool, repeat: RepeatMode) {
        self.update(|s| {
            s.volume = if muted { 0.0 } else { f64::from(volume) };
            s.shuffle = shuffle;
            s.repeat = repeat;
        });
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "encore"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn owned(value: Value<'_>) -> Option<OwnedValue> {
    OwnedValue::try_from(value).ok()
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Prev);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            TransportState::Idle => "Stopped",
            TransportState::Playing => "Playing",
            TransportState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "None";
        };
        match s.repeat {
            RepeatMode::Off => "None",
            RepeatMode::All => "Playlist",
            RepeatMode::One => "Track",
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state.lock().map(|s| s.volume).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let entries = [
            (
                "mpris:trackid",
                s.track_id
                    .clone()
                    .and_then(|p| owned(Value::from(p.into_inner()))),
            ),
            (
                "xesam:title",
                s.title.clone().and_then(|t| owned(Value::from(t))),
            ),
            (
                "xesam:artist",
                (!s.artist.is_empty())
                    .then(|| owned(Value::from(s.artist.clone())))
                    .flatten(),
            ),
            (
                "xesam:album",
                s.album.clone().and_then(|a| owned(Value::from(a))),
            ),
            ("xesam:url", s.url.clone().and_then(|u| owned(Value::from(u)))),
            (
                "mpris:length",
                s.length_micros.and_then(|l| owned(Value::from(l))),
            ),
        ];
        for (key, value) in entries {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        }
        map
    }
}

/// Emit `PropertiesChanged` for everything the player exposes.
async fn emit_player_changes(connection: &Connection) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    let emitter = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.volume_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    info!(name = BUS_NAME, "MPRIS service registered");

    loop {
        Timer::after(NOTIFY_POLL).await;
        let mut changed = false;
        loop {
            match notify.try_recv() {
                Ok(()) => changed = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("MPRIS handle dropped, shutting down");
                    return Ok(());
                }
            }
        }
        if changed {
            if let Err(e) = emit_player_changes(&connection).await {
                debug!(error = %e, "MPRIS: failed to emit property changes");
            }
        }
    }
}

pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
            warn!(error = %e, "MPRIS unavailable");
        }
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}

#[cfg(test)]
mod tests;
