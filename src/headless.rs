//! In-process frame player for native hosts and tests.

use crate::{FramePlayer, ReadySignal};

/// How a [`HeadlessPlayer`] completes loading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadMode {
    /// Fire the ready signal from inside `load`
    #[default]
    Immediate,
    /// Hold the signal until [`HeadlessPlayer::finish_loading`] is called
    Deferred,
}

/// A capability call observed by a [`HeadlessPlayer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerCall {
    Load,
    Play,
    Pause,
    MoveTo(usize),
    MoveRelative(i32),
}

/// Platform-agnostic frame cursor implementing [`FramePlayer`].
///
/// It keeps the playback position of an animation with `frame_count`
/// frames but does not decode anything. The host calls `tick()` at its own
/// frame rate to advance a playing cursor. Every capability call is
/// recorded so callers can inspect exactly what the control layer asked for.
///
/// ## Example
///
/// ```rust
/// use webp_player_ui::{FramePlayer, HeadlessPlayer};
///
/// let mut player = HeadlessPlayer::new(10);
/// player.play();
/// for _ in 0..3 {
///     player.tick();
/// }
/// assert_eq!(player.current_frame(), 3);
///
/// player.move_relative(-5); // wraps around the start
/// assert_eq!(player.current_frame(), 8);
/// assert!(!player.is_playing());
/// ```
#[derive(Debug)]
pub struct HeadlessPlayer {
    /// Current frame index
    current_frame: usize,
    /// Total number of frames
    frame_count: usize,
    playing: bool,
    autoplay: bool,
    supported: bool,
    load_mode: LoadMode,
    /// Signal held back in `LoadMode::Deferred`
    pending: Option<ReadySignal>,
    loaded: bool,
    calls: Vec<PlayerCall>,
}

impl HeadlessPlayer {
    /// Create a supported player with `frame_count` frames that loads immediately.
    pub fn new(frame_count: usize) -> Self {
        Self {
            current_frame: 0,
            frame_count,
            playing: false,
            autoplay: false,
            supported: true,
            load_mode: LoadMode::Immediate,
            pending: None,
            loaded: false,
            calls: Vec::new(),
        }
    }

    /// Start playing on its own once loading completes.
    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Report the source as unsupported after loading.
    pub fn unsupported(mut self) -> Self {
        self.supported = false;
        self
    }

    pub fn with_load_mode(mut self, mode: LoadMode) -> Self {
        self.load_mode = mode;
        self
    }

    /// Complete a deferred load. Returns `false` if nothing was pending.
    pub fn finish_loading(&mut self) -> bool {
        match self.pending.take() {
            Some(ready) => {
                self.complete(ready);
                true
            }
            None => false,
        }
    }

    fn complete(&mut self, ready: ReadySignal) {
        self.loaded = true;
        if self.autoplay && self.supported {
            self.playing = self.frame_count > 0;
        }
        ready.fire();
    }

    /// Advance a playing cursor by one frame, looping at the end.
    ///
    /// Returns true if the frame changed.
    pub fn tick(&mut self) -> bool {
        if !self.playing || self.frame_count == 0 {
            return false;
        }
        self.current_frame = (self.current_frame + 1) % self.frame_count;
        true
    }

    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Every capability call received so far, oldest first.
    pub fn calls(&self) -> &[PlayerCall] {
        &self.calls
    }

    /// Number of recorded calls matching `call`.
    pub fn count(&self, call: PlayerCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl FramePlayer for HeadlessPlayer {
    fn play(&mut self) {
        self.calls.push(PlayerCall::Play);
        if self.frame_count > 0 {
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        self.calls.push(PlayerCall::Pause);
        self.playing = false;
    }

    fn move_to(&mut self, frame: usize) {
        self.calls.push(PlayerCall::MoveTo(frame));
        self.current_frame = frame.min(self.frame_count.saturating_sub(1));
    }

    fn move_relative(&mut self, delta: i32) {
        self.calls.push(PlayerCall::MoveRelative(delta));
        self.playing = false;
        if self.frame_count == 0 {
            return;
        }
        let count = self.frame_count as i64;
        let next = (self.current_frame as i64 + delta as i64).rem_euclid(count);
        self.current_frame = next as usize;
    }

    fn supported(&self) -> bool {
        self.supported
    }

    fn load(&mut self, ready: ReadySignal) {
        self.calls.push(PlayerCall::Load);
        match self.load_mode {
            LoadMode::Immediate => self.complete(ready),
            LoadMode::Deferred => self.pending = Some(ready),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventQueue, InstanceId, ViewerEvent};

    #[test]
    fn basic_playback() {
        let mut player = HeadlessPlayer::new(10);
        assert!(!player.is_playing());

        player.play();
        for _ in 0..5 {
            player.tick();
        }
        assert_eq!(player.current_frame(), 5);

        player.pause();
        assert!(!player.tick());
        assert_eq!(player.current_frame(), 5);
    }

    #[test]
    fn tick_loops() {
        let mut player = HeadlessPlayer::new(5);
        player.play();
        for _ in 0..6 {
            player.tick();
        }
        // 0 -> 1 -> 2 -> 3 -> 4 -> 0 -> 1
        assert_eq!(player.current_frame(), 1);
    }

    #[test]
    fn move_relative_wraps() {
        let mut player = HeadlessPlayer::new(10);
        player.move_to(9);
        player.move_relative(1);
        assert_eq!(player.current_frame(), 0);
        player.move_relative(-1);
        assert_eq!(player.current_frame(), 9);
        player.move_relative(-23);
        assert_eq!(player.current_frame(), 6);
    }

    #[test]
    fn move_to_clamps() {
        let mut player = HeadlessPlayer::new(4);
        player.move_to(100);
        assert_eq!(player.current_frame(), 3);

        let mut empty = HeadlessPlayer::new(0);
        empty.move_to(3);
        empty.move_relative(2);
        assert_eq!(empty.current_frame(), 0);
    }

    #[test]
    fn immediate_load_fires() {
        let queue = EventQueue::new();
        let id = InstanceId::new(1);
        let mut player = HeadlessPlayer::new(3).with_autoplay(true);
        player.load(ReadySignal::new(id, queue.clone()));

        assert!(player.is_loaded());
        assert!(player.is_playing());
        assert_eq!(queue.pop(), Some(ViewerEvent::Loaded(id)));
    }

    #[test]
    fn deferred_load() {
        let queue = EventQueue::new();
        let mut player = HeadlessPlayer::new(3).with_load_mode(LoadMode::Deferred);
        player.load(ReadySignal::new(InstanceId::new(2), queue.clone()));
        assert!(queue.is_empty());
        assert!(!player.is_loaded());

        assert!(player.finish_loading());
        assert_eq!(queue.len(), 1);
        assert!(!player.finish_loading());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn call_log() {
        let mut player = HeadlessPlayer::new(3);
        player.play();
        player.pause();
        player.move_relative(1);
        player.move_relative(1);
        assert_eq!(
            player.calls(),
            &[
                PlayerCall::Play,
                PlayerCall::Pause,
                PlayerCall::MoveRelative(1),
                PlayerCall::MoveRelative(1)
            ]
        );
        assert_eq!(player.count(PlayerCall::MoveRelative(1)), 2);
    }
}
