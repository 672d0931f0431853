//! Application model types: `App`, `Focus` and `NowPlaying`.
//!
//! The `App` struct holds the scanned library, the browsing cursor and a
//! snapshot of the transport fed by `TransportEvent`s.

use std::time::Duration;

use crate::audio::{FailureKind, RepeatMode, TransportEvent, TransportState};
use crate::library::{Album, Track};

/// Which pane the cursor keys move.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Albums,
    Tracks,
}

/// What the transport last reported. Only ever written from events.
#[derive(Clone, Debug, PartialEq)]
pub struct NowPlaying {
    pub track: Option<Track>,
    pub index: Option<usize>,
    pub state: TransportState,
    pub position: Duration,
    pub volume: f32,
    pub muted: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl Default for NowPlaying {
    fn default() -> Self {
        Self {
            track: None,
            index: None,
            state: TransportState::Idle,
            position: Duration::ZERO,
            volume: 1.0,
            muted: false,
            shuffle: false,
            repeat: RepeatMode::Off,
        }
    }
}

/// The main application model.
pub struct App {
    pub albums: Vec<Album>,
    pub selected_album: usize,
    pub selected_track: usize,
    pub focus: Focus,

    pub follow_playback: bool,
    pub now_playing: NowPlaying,
    /// Label of the output holding the playback resource, if any.
    pub audible_output: Option<String>,

    pub current_dir: Option<String>,
    pub metadata_window: bool,
    /// Most recent playback failure, cleared when the track changes.
    pub last_error: Option<(FailureKind, String)>,
}

impl App {
    /// Create a new `App` browsing `albums`.
    pub fn new(albums: Vec<Album>) -> Self {
        Self {
            albums,
            selected_album: 0,
            selected_track: 0,
            focus: Focus::Albums,
            follow_playback: true,
            now_playing: NowPlaying::default(),
            audible_output: None,
            current_dir: None,
            metadata_window: false,
            last_error: None,
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    /// Record the current directory in the app state.
    pub fn set_current_dir(&mut self, dir: String) {
        self.current_dir = Some(dir);
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
        self.follow_now_playing();
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Albums => Focus::Tracks,
            Focus::Tracks => Focus::Albums,
        };
    }

    pub fn has_tracks(&self) -> bool {
        self.albums.iter().any(|a| !a.tracks.is_empty())
    }

    pub fn selected_album(&self) -> Option<&Album> {
        self.albums.get(self.selected_album)
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.selected_album()
            .and_then(|a| a.tracks.get(self.selected_track))
    }

    /// The album containing the now-playing track.
    pub fn playing_album(&self) -> Option<&Album> {
        let track = self.now_playing.track.as_ref()?;
        self.albums.iter().find(|a| a.id == track.album)
    }

    /// Queue to hand to the transport for the current selection: the whole
    /// selected album, starting at the highlighted track (or the first one
    /// when the album pane has focus).
    pub fn selection_queue(&self) -> Option<(Vec<Track>, usize)> {
        let album = self.selected_album()?;
        if album.tracks.is_empty() {
            return None;
        }
        let start = match self.focus {
            Focus::Albums => 0,
            Focus::Tracks => self.selected_track.min(album.tracks.len() - 1),
        };
        Some((album.tracks.clone(), start))
    }

    /// Whether the selection is exactly what is already playing.
    pub fn is_playing_selection(&self) -> bool {
        self.now_playing.state == TransportState::Playing
            && self.focus == Focus::Tracks
            && match (&self.now_playing.track, self.selected_track()) {
                (Some(playing), Some(selected)) => playing.id == selected.id,
                _ => false,
            }
    }

    /// Move the cursor of the focused pane down, wrapping to the top.
    pub fn next(&mut self) {
        match self.focus {
            Focus::Albums => {
                if !self.albums.is_empty() {
                    self.selected_album = (self.selected_album + 1) % self.albums.len();
                    self.selected_track = 0;
                }
            }
            Focus::Tracks => {
                let len = self.selected_album().map_or(0, |a| a.tracks.len());
                if len > 0 {
                    self.selected_track = (self.selected_track + 1) % len;
                }
            }
        }
    }

    /// Move the cursor of the focused pane up, wrapping to the bottom.
    pub fn prev(&mut self) {
        match self.focus {
            Focus::Albums => {
                let len = self.albums.len();
                if len > 0 {
                    self.selected_album = (self.selected_album + len - 1) % len;
                    self.selected_track = 0;
                }
            }
            Focus::Tracks => {
                let len = self.selected_album().map_or(0, |a| a.tracks.len());
                if len > 0 {
                    self.selected_track = (self.selected_track + len - 1) % len;
                }
            }
        }
    }

    pub fn select_first(&mut self) {
        match self.focus {
            Focus::Albums => {
                self.selected_album = 0;
                self.selected_track = 0;
            }
            Focus::Tracks => self.selected_track = 0,
        }
    }

    pub fn select_last(&mut self) {
        match self.focus {
            Focus::Albums => {
                self.selected_album = self.albums.len().saturating_sub(1);
                self.selected_track = 0;
            }
            Focus::Tracks => {
                let len = self.selected_album().map_or(0, |a| a.tracks.len());
                self.selected_track = len.saturating_sub(1);
            }
        }
    }

    /// Put the cursor on the now-playing track, if there is one.
    pub fn jump_to_playing(&mut self) {
        let Some(track) = self.now_playing.track.as_ref() else {
            return;
        };
        let Some(album_pos) = self.albums.iter().position(|a| a.id == track.album) else {
            return;
        };
        self.selected_album = album_pos;
        self.selected_track = self.albums[album_pos]
            .position_of(track.id)
            .unwrap_or(0);
        self.focus = Focus::Tracks;
    }

    fn follow_now_playing(&mut self) {
        if self.follow_playback {
            self.jump_to_playing();
        }
    }

    /// Fold a transport event into the now-playing snapshot.
    pub fn apply_event(&mut self, event: &TransportEvent) {
        let np = &mut self.now_playing;
        match event {
            TransportEvent::TrackChanged { track, index } => {
                np.track = track.clone();
                np.index = *index;
                np.position = Duration::ZERO;
                if track.is_none() {
                    np.state = TransportState::Idle;
                }
                self.last_error = None;
                self.follow_now_playing();
            }
            TransportEvent::StateChanged(state) => np.state = *state,
            TransportEvent::PositionChanged(position) => np.position = *position,
            TransportEvent::VolumeChanged { volume, muted } => {
                np.volume = *volume;
                np.muted = *muted;
            }
            TransportEvent::ModesChanged { shuffle, repeat } => {
                np.shuffle = *shuffle;
                np.repeat = *repeat;
            }
            TransportEvent::Failed { kind, message } => {
                self.last_error = Some((*kind, message.clone()));
            }
        }
    }
}
