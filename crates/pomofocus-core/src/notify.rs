//! Sound side-channel.
//!
//! Calls are fire-and-forget from the state machine's point of view: a
//! failing notifier is reported as a notice and never blocks a transition.

use std::io;

/// Alarm and soundscape playback.
pub trait Notifier {
    fn play_alarm(&self, sound: &str, volume: f32, fade_in: bool) -> io::Result<()>;

    /// Start or stop the background soundscape.
    fn set_soundscape(&self, soundscape: &str, volume: f32, playing: bool) -> io::Result<()>;
}

/// Notifier that does nothing. Used in tests and headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn play_alarm(&self, _sound: &str, _volume: f32, _fade_in: bool) -> io::Result<()> {
        Ok(())
    }

    fn set_soundscape(&self, _soundscape: &str, _volume: f32, _playing: bool) -> io::Result<()> {
        Ok(())
    }
}
