//! Fire-and-forget sound dispatch
//!
//! Playback runs on a dedicated worker thread; the game loop only posts cue
//! messages through a mutex-guarded channel and never waits on completion.
//! A dropped or failed sound is logged, never an error the game sees.

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

/// Sound cues the game can trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    Bounce,
    BrickBreak,
    PowerUp,
    BallLost,
    LevelClear,
    GameOver,
    Click,
}

/// Playback boundary. The worker thread owns the sink; implementations may
/// talk to an audio device or do nothing at all.
pub trait AudioSink: Send + 'static {
    fn play(&mut self, sound: Sound, volume: f32);
}

/// Sink that only logs; used when no audio device is available
pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, sound: Sound, volume: f32) {
        log::debug!("Audio - {sound:?} at volume {volume:.2}");
    }
}

enum Message {
    Play(Sound, f32),
    Shutdown,
}

pub struct AudioSystem {
    sender: Mutex<mpsc::Sender<Message>>,
    worker: Option<thread::JoinHandle<()>>,
    volume: f32,
}

impl AudioSystem {
    pub fn new<S: AudioSink>(mut sink: S, volume: f32) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker = thread::Builder::new()
            .name("audio".into())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    match message {
                        Message::Play(sound, volume) => sink.play(sound, volume),
                        Message::Shutdown => break,
                    }
                }
            })
            .ok();
        if worker.is_none() {
            log::warn!("Audio - failed to spawn worker thread, sound disabled");
        }
        Self {
            sender: Mutex::new(sender),
            worker,
            volume: volume.clamp(0.0, 1.0),
        }
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Non-blocking; safe to call from the frame loop
    pub fn play(&self, sound: Sound) {
        if self.volume <= 0.0 {
            return;
        }
        let Ok(sender) = self.sender.lock() else {
            log::warn!("Audio - sender mutex poisoned, dropping {sound:?}");
            return;
        };
        if sender.send(Message::Play(sound, self.volume)).is_err() {
            log::warn!("Audio - worker gone, dropping {sound:?}");
        }
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(Message::Shutdown);
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Receiver;

    struct RecordingSink(mpsc::Sender<(Sound, f32)>);

    impl AudioSink for RecordingSink {
        fn play(&mut self, sound: Sound, volume: f32) {
            let _ = self.0.send((sound, volume));
        }
    }

    fn recording_system(volume: f32) -> (AudioSystem, Receiver<(Sound, f32)>) {
        let (tx, rx) = mpsc::channel();
        (AudioSystem::new(RecordingSink(tx), volume), rx)
    }

    #[test]
    fn test_play_reaches_the_worker() {
        let (audio, rx) = recording_system(0.8);
        audio.play(Sound::Bounce);
        let (sound, volume) = rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();
        assert_eq!(sound, Sound::Bounce);
        assert!((volume - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_zero_volume_drops_sounds() {
        let (audio, rx) = recording_system(0.0);
        audio.play(Sound::Click);
        drop(audio);
        assert!(rx.recv().is_err());
    }
}
