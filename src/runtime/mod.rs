use std::cell::RefCell;
use std::env;
use std::path::Path;
use std::rc::Rc;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::audio::{
    PlaybackResource, RodioOutput, SampleBuffer, SharedOutput, Subscription, Transport,
    TransportEvent,
};
use crate::library::scan;
use crate::mpris::ControlCmd;
use crate::visualizer::Visualizer;

mod event_loop;
mod mpris_sync;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_warning) = settings::load_settings();
    settings::init_logging(&settings.logging);
    if let Some(msg) = config_warning {
        warn!("{msg}");
    }

    let dir = env::args().nth(1).unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.to_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "Music".to_string())
    });

    let albums = scan(Path::new(&dir), &settings.library);

    // One resource per process; every output that can make sound attaches to it.
    let resource = Rc::new(PlaybackResource::new());
    let tap = SampleBuffer::new(settings.audio.tap_capacity);
    let output: SharedOutput = Rc::new(RefCell::new(RodioOutput::open(tap.clone())?));
    let transport = Transport::new(resource.clone(), output, "library", &settings.playback);

    let (event_tx, event_rx) = mpsc::channel::<TransportEvent>();
    let _events: Subscription =
        transport.subscribe(move |ev| event_tx.send(ev.clone()).map_err(Into::into));

    let mut app = App::new(albums);
    if !app.has_tracks() {
        warn!(dir = %dir, "no playable tracks found");
    }
    app.set_current_dir(dir.clone());
    startup::apply_playback_defaults(&mut app, &transport, &settings);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());
    mpris_sync::update_mpris(&mpris, &app);

    let visualizer = settings.ui.visualizer.then(|| {
        Visualizer::new(settings.ui.visualizer_points, settings.audio.tap_capacity)
    });

    let mut player = event_loop::Player {
        transport,
        resource,
        tap,
        events: event_rx,
        visualizer,
    };
    info!(dir = %dir, "starting");

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = event_loop::EventLoopState::default();
    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        &mut app,
        &mut player,
        &mpris,
        &control_tx,
        &control_rx,
        &mut state,
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}
