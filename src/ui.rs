//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::{collections::BTreeMap, sync::LazyLock, time::Duration};

use crate::app::{App, Focus};
use crate::audio::{FailureKind, RepeatMode, TransportState};
use crate::config::{ControlsSettings, TimeField, UiSettings};
use crate::visualizer::Visualizer;

static CONTROLS_MAP: LazyLock<BTreeMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut map = BTreeMap::new();
    map.insert("j/k", "up/down");
    map.insert("tab", "albums/tracks");
    map.insert("gg/G", "top/bottom");
    map.insert("enter", "play selection");
    map.insert("space/p", "play/pause");
    map.insert("x", "stop");
    map.insert("h/l", "prev/next track");
    // H/L is filled dynamically from config.
    map.insert("+/-", "volume");
    map.insert("m", "mute");
    map.insert("s", "shuffle");
    map.insert("r", "repeat mode");
    map.insert("zz", "jump to playing");
    map.insert("K", "metadata");
    map.insert("q", "quit");
    map
});

/// Render the controls help text, incorporating scrub seconds.
fn controls_text(scrub_seconds: u64) -> String {
    let order = [
        "j/k", "tab", "h/l", "H/L", "enter", "space/p", "x", "+/-", "m", "gg/G", "zz", "K", "s",
        "r", "q",
    ];
    order
        .iter()
        .filter_map(|k| {
            if *k == "H/L" {
                Some(format!("[H/L] scrub -/+{}s", scrub_seconds))
            } else {
                CONTROLS_MAP.get(*k).map(|v| format!("[{}] {}", k, v))
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Format a `Duration` as `MM:SS`.
fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Build the now-playing time text (elapsed/total/remaining) per `UiSettings`.
fn now_playing_time_text(
    elapsed: Duration,
    total: Option<Duration>,
    ui: &UiSettings,
) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => total.map(format_mmss),
            TimeField::Remaining => {
                total.map(|t| format!("-{}", format_mmss(t.saturating_sub(elapsed))))
            }
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(&ui.now_playing_time_separator))
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    // Keep the popup smaller and avoid covering the entire UI.
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn padded_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .padding(Padding {
            left: 1,
            right: 0,
            top: 0,
            bottom: 0,
        })
}

fn status_text(app: &App, ui: &UiSettings) -> String {
    let np = &app.now_playing;
    let mut parts: Vec<String> = Vec::new();

    parts.push(
        match np.state {
            TransportState::Idle => "Stopped",
            TransportState::Paused => "Paused",
            TransportState::Playing => "Playing",
        }
        .to_string(),
    );

    if let Some(track) = &np.track {
        let song = match track.artist.as_deref().filter(|a| !a.trim().is_empty()) {
            Some(artist) => format!("{} - {}", artist, track.title),
            None => track.title.clone(),
        };
        match now_playing_time_text(np.position, track.duration, ui) {
            Some(time) => parts.push(format!("Song: {} [{}]", song, time)),
            None => parts.push(format!("Song: {}", song)),
        }
        if let (Some(i), Some(album)) = (np.index, app.playing_album()) {
            parts.push(format!("Track {}/{}", i + 1, album.tracks.len()));
        }
    }

    if np.muted {
        parts.push("Volume: muted".to_string());
    } else {
        parts.push(format!("Volume: {:.0}%", np.volume * 100.0));
    }

    parts.push(format!(
        "Shuffle: {}",
        if np.shuffle { "ON" } else { "OFF" }
    ));
    parts.push(
        match np.repeat {
            RepeatMode::Off => "Repeat: Off",
            RepeatMode::All => "Repeat: All",
            RepeatMode::One => "Repeat: One",
        }
        .to_string(),
    );

    parts.push(if app.follow_playback {
        "CURSOR: Follow".to_string()
    } else {
        "CURSOR: Free-roam".to_string()
    });

    if let Some(output) = &app.audible_output {
        parts.push(format!("Output: {}", output));
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir));
    }

    match &app.last_error {
        Some((FailureKind::Device, msg)) => parts.push(format!("Device error: {}", msg)),
        Some((_, msg)) => parts.push(format!("Error: {}", msg)),
        None => {}
    }

    parts.join(" • ")
}

/// Render a list whose window keeps `selected` centered when possible.
fn render_centered_list(
    frame: &mut Frame,
    area: Rect,
    labels: Vec<String>,
    selected: usize,
    title: &str,
    focused: bool,
) {
    let total = labels.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let selected = selected.min(total.saturating_sub(1));
    let (start, end) = if total <= list_height || list_height == 0 {
        (0, total)
    } else {
        let half = list_height / 2;
        let mut start = selected.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height)
    };

    let items: Vec<ListItem> = labels
        .into_iter()
        .skip(start)
        .take(end - start)
        .map(ListItem::new)
        .collect();

    let mut block = Block::default().borders(Borders::ALL).title(title);
    if focused {
        block = block.border_style(Style::default().add_modifier(Modifier::BOLD));
    }
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ListState::default();
    if total > 0 {
        state.select(Some(selected - start));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn metadata_text(app: &App) -> String {
    let (Some(album), Some(track)) = (app.selected_album(), app.selected_track()) else {
        return "No track selected".to_string();
    };
    format!(
        "Title: {}\nArtist: {}\nAlbum: {} ({})\nTrack: {}\nDuration: {}\nPath: {}\nCover: {}",
        track.title,
        track.artist.as_deref().unwrap_or("-"),
        album.title,
        album.artist,
        track.number.map_or("-".to_string(), |n| n.to_string()),
        track.duration.map_or("-".to_string(), format_mmss),
        track.source.display(),
        album
            .cover
            .as_ref()
            .map_or("-".to_string(), |c| c.display().to_string()),
    )
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    visualizer: Option<&Visualizer>,
    ui_settings: &UiSettings,
    controls_settings: &ControlsSettings,
) {
    let mut constraints = vec![
        Constraint::Length(3),
        Constraint::Length(5),
        Constraint::Min(1),
    ];
    if visualizer.is_some() {
        constraints.push(Constraint::Length(8));
    }
    constraints.push(Constraint::Length(4));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" encore ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app, ui_settings))
        .slow_blink()
        .block(padded_block(" status "))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Albums | tracks
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[2]);

    let playing_album = app.playing_album().map(|a| a.id);
    let playing_track = app.now_playing.track.as_ref().map(|t| t.id);

    let album_labels = app
        .albums
        .iter()
        .map(|a| {
            let marker = if Some(a.id) == playing_album { "♪ " } else { "" };
            format!(
                "{}{} - {} [{}]",
                marker,
                a.artist,
                a.title,
                format_mmss(a.total_duration())
            )
        })
        .collect();
    render_centered_list(
        frame,
        panes[0],
        album_labels,
        app.selected_album,
        " albums ",
        app.focus == Focus::Albums,
    );

    let track_labels = app
        .selected_album()
        .map(|a| {
            a.tracks
                .iter()
                .map(|t| {
                    let marker = if Some(t.id) == playing_track { "♪ " } else { "" };
                    format!("{}{}", marker, t.display)
                })
                .collect()
        })
        .unwrap_or_default();
    render_centered_list(
        frame,
        panes[1],
        track_labels,
        app.selected_track,
        " tracks ",
        app.focus == Focus::Tracks,
    );

    // Overlay metadata popup (keeps lists visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(app))
            .block(padded_block(" metadata (K closes) "))
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    let mut next = 3;
    if let Some(vis) = visualizer {
        frame.render_widget(vis, chunks[next]);
        next += 1;
    }

    let footer = Paragraph::new(controls_text(controls_settings.scrub_seconds))
        .block(padded_block(" controls "))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[next]);
}
