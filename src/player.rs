//! Capability surface of the decoding/rendering engine.
//!
//! The control layer never decodes frames itself. It drives whatever engine
//! the host plugs in through [`FramePlayer`], and learns that the engine is
//! ready through a one-shot [`ReadySignal`].

use crate::{EventQueue, InstanceId, ViewerEvent};

/// Playback capability of one decoding/rendering instance.
///
/// No `Send` bounds: handles live on the UI thread in both native and WASM
/// contexts.
pub trait FramePlayer {
    /// Start or resume playback.
    fn play(&mut self);

    /// Halt playback on the current frame.
    fn pause(&mut self);

    /// Jump to an absolute frame index.
    fn move_to(&mut self, frame: usize);

    /// Step by `delta` frames (negative steps backward).
    fn move_relative(&mut self, delta: i32);

    /// Whether the engine can actually render this source.
    ///
    /// Only meaningful after loading completes.
    fn supported(&self) -> bool;

    /// Begin loading. The engine must fire `ready` once loading completes;
    /// it may do so before returning.
    fn load(&mut self, ready: ReadySignal);
}

/// One-shot notification that a handle finished loading.
///
/// Consuming `fire` guarantees the load completion is delivered at most
/// once per registration.
#[derive(Debug)]
#[must_use = "the viewer never gets controls unless the signal fires"]
pub struct ReadySignal {
    instance: InstanceId,
    queue: EventQueue,
}

impl ReadySignal {
    pub(crate) fn new(instance: InstanceId, queue: EventQueue) -> Self {
        Self { instance, queue }
    }

    /// The viewer this signal belongs to.
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    /// Report that loading completed.
    pub fn fire(self) {
        tracing::debug!(instance = %self.instance, "player ready");
        self.queue.push(ViewerEvent::Loaded(self.instance));
    }
}
