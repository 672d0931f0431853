use crate::app::App;
use crate::mpris::MprisHandle;

pub fn update_mpris(mpris: &MprisHandle, app: &App) {
    let np = &app.now_playing;
    let album = app.playing_album().map(|a| a.title.as_str());
    mpris.set_track_metadata(np.track.as_ref(), album);
    mpris.set_playback(np.state);
    mpris.set_options(np.volume, np.muted, np.shuffle, np.repeat);
}
