use crate::app::App;
use crate::audio::Transport;
use crate::config;

/// Seed the app snapshot with the transport's configured defaults, before
/// any event has been published.
pub fn apply_playback_defaults(app: &mut App, transport: &Transport, settings: &config::Settings) {
    app.follow_playback = settings.ui.follow_playback;

    let session = transport.session();
    let np = &mut app.now_playing;
    np.track = session.track.clone();
    np.index = transport.current_index();
    np.state = session.state();
    np.volume = session.volume;
    np.muted = session.muted;
    np.shuffle = session.shuffle;
    np.repeat = session.repeat;
}
