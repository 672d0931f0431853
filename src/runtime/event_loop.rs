use std::rc::Rc;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{debug, info};

use crate::app::App;
use crate::audio::{Direction, PlaybackResource, SampleBuffer, Transport, TransportEvent, TransportState};
use crate::config;
use crate::error::TransportError;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::update_mpris;
use crate::ui;
use crate::visualizer::{SampleProvider, Visualizer};

/// Everything on the playback side the loop drives.
pub struct Player {
    pub transport: Transport,
    pub resource: Rc<PlaybackResource>,
    pub tap: SampleBuffer,
    pub events: mpsc::Receiver<TransportEvent>,
    pub visualizer: Option<Visualizer>,
}

/// State tracked by the runtime event loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    pending_zz: bool,
}

/// Main terminal event loop: ticks the transport, folds its events into the
/// app, draws, and handles input from the keyboard and MPRIS. Returns
/// `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player,
    mpris: &MprisHandle,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        player.transport.tick();

        // Keep MPRIS in sync even when changes come from media keys or auto-advance.
        let mut changed = false;
        while let Ok(ev) = player.events.try_recv() {
            app.apply_event(&ev);
            changed = true;
        }
        if changed {
            update_mpris(mpris, app);
        }
        app.audible_output = player.resource.active_label();

        let playing = app.now_playing.state == TransportState::Playing;
        if let Some(vis) = player.visualizer.as_mut() {
            vis.refresh(playing, Some(&player.tap as &dyn SampleProvider));
        }

        terminal.draw(|f| {
            ui::draw(
                f,
                app,
                player.visualizer.as_ref(),
                &settings.ui,
                &settings.controls,
            )
        })?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, settings, app, player) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, settings, app, player, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Failures are already published as `TransportEvent::Failed`; only note them here.
fn report(result: Result<(), TransportError>) {
    if let Err(e) = result {
        debug!(error = %e, "playback command failed");
    }
}

/// Replace the queue with the current selection and start playing it.
fn play_selection(app: &mut App, transport: &mut Transport) {
    if app.is_playing_selection() {
        return;
    }
    if let Some((tracks, start)) = app.selection_queue() {
        app.follow_playback_on();
        report(
            transport
                .load_queue(tracks, start)
                .and_then(|()| transport.play()),
        );
    }
}

fn quit(settings: &config::Settings, player: &mut Player) {
    info!("shutting down");
    player
        .transport
        .fade_out(Duration::from_millis(settings.audio.quit_fade_out_ms));
    if let Some(vis) = player.visualizer.as_mut() {
        vis.teardown();
    }
}

fn handle_control_cmd(
    cmd: ControlCmd,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player,
) -> bool {
    let transport = &mut player.transport;
    match cmd {
        ControlCmd::Quit => {
            quit(settings, player);
            return true;
        }
        ControlCmd::Play => match transport.state() {
            TransportState::Idle => play_selection(app, transport),
            _ => report(transport.play()),
        },
        ControlCmd::Pause => transport.pause(),
        ControlCmd::PlayPause => match transport.state() {
            TransportState::Idle => play_selection(app, transport),
            _ => report(transport.toggle_play()),
        },
        ControlCmd::Stop => transport.stop(),
        ControlCmd::Next => {
            app.follow_playback_on();
            report(transport.advance(Direction::Next));
        }
        ControlCmd::Prev => {
            app.follow_playback_on();
            report(transport.advance(Direction::Previous));
        }
    }

    false
}

fn handle_key_event(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App,
    player: &mut Player,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    // Any key other than the second half of a prefix cancels it.
    let pending_gg = std::mem::take(&mut state.pending_gg);
    let pending_zz = std::mem::take(&mut state.pending_zz);
    let transport = &mut player.transport;
    let scrub = i64::try_from(settings.controls.scrub_seconds).unwrap_or(i64::MAX);

    match key.code {
        KeyCode::Char('q') => {
            quit(settings, player);
            return true;
        }
        KeyCode::Char('g') => {
            if pending_gg {
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        KeyCode::Char('z') => {
            if pending_zz {
                app.jump_to_playing();
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.prev();
        }
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Enter => play_selection(app, transport),
        KeyCode::Char('p') | KeyCode::Char(' ') => {
            let _ = control_tx.send(ControlCmd::PlayPause);
        }
        KeyCode::Char('l') => {
            let _ = control_tx.send(ControlCmd::Next);
        }
        KeyCode::Char('h') => {
            let _ = control_tx.send(ControlCmd::Prev);
        }
        KeyCode::Char('x') => {
            let _ = control_tx.send(ControlCmd::Stop);
        }
        KeyCode::Char('L') => transport.seek_by(scrub),
        KeyCode::Char('H') => transport.seek_by(-scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let v = transport.session().volume;
            transport.set_volume(v + settings.controls.volume_step);
        }
        KeyCode::Char('-') => {
            let v = transport.session().volume;
            transport.set_volume(v - settings.controls.volume_step);
        }
        KeyCode::Char('m') => transport.toggle_mute(),
        KeyCode::Char('s') => transport.toggle_shuffle(),
        KeyCode::Char('r') => transport.cycle_repeat(),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    false
}
