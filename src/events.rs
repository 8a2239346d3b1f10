//! Input events and the deferred event queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::{Affordance, InstanceId, TimerId};

/// Stepping direction for prev/next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Backward,
    Forward,
}

impl Direction {
    /// Frame delta passed to `move_relative`.
    #[inline]
    pub fn delta(self) -> i32 {
        match self {
            Direction::Backward => -1,
            Direction::Forward => 1,
        }
    }

    /// The affordance that starts a move in this direction.
    pub fn affordance(self) -> Affordance {
        match self {
            Direction::Backward => Affordance::Prev,
            Direction::Forward => Affordance::Next,
        }
    }
}

/// What a click inside a viewer region landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickTarget {
    /// The rendering surface (the canvas the engine draws to)
    Surface,
    /// Anything else inside the region that is not an affordance
    Other,
}

/// Everything the control layer reacts to.
///
/// Hosts translate raw UI input into these; engine and timer callbacks
/// push them onto an [`EventQueue`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The handle for `instance` finished loading.
    Loaded(InstanceId),
    /// A click inside the region that did not hit an affordance.
    RegionClicked {
        instance: InstanceId,
        target: ClickTarget,
    },
    /// Play, pause, stop or one of the fullscreen affordances was clicked.
    AffordanceClicked {
        instance: InstanceId,
        affordance: Affordance,
    },
    /// Prev/next pressed (mousedown).
    MovePressed {
        instance: InstanceId,
        direction: Direction,
    },
    /// Prev/next released (mouseup).
    MoveReleased { instance: InstanceId },
    /// A continuous-move timer fired.
    Tick { instance: InstanceId, timer: TimerId },
    /// A click inside the fullscreen overlay. `on_background` is true
    /// only when the target is the overlay container itself.
    OverlayClicked { on_background: bool },
    /// The overlay chrome's own exit control was clicked.
    OverlayExitClicked,
    /// A key-down anywhere in the document.
    KeyDown { key: String },
}

impl ViewerEvent {
    /// The instance this event addresses, if any.
    pub fn instance(&self) -> Option<InstanceId> {
        match self {
            ViewerEvent::Loaded(id) => Some(*id),
            ViewerEvent::RegionClicked { instance, .. }
            | ViewerEvent::AffordanceClicked { instance, .. }
            | ViewerEvent::MovePressed { instance, .. }
            | ViewerEvent::MoveReleased { instance }
            | ViewerEvent::Tick { instance, .. } => Some(*instance),
            ViewerEvent::OverlayClicked { .. }
            | ViewerEvent::OverlayExitClicked
            | ViewerEvent::KeyDown { .. } => None,
        }
    }

    /// The click event for a click inside a command bar that hit
    /// `affordance`, or nothing in particular.
    ///
    /// Prev and next clicks yield nothing: stepping comes from press and
    /// release. A click on a gap in the bar is still a click in the region.
    pub fn bar_click(instance: InstanceId, affordance: Option<Affordance>) -> Option<Self> {
        match affordance {
            Some(Affordance::Prev | Affordance::Next) => None,
            Some(affordance) => Some(ViewerEvent::AffordanceClicked {
                instance,
                affordance,
            }),
            None => Some(ViewerEvent::RegionClicked {
                instance,
                target: ClickTarget::Other,
            }),
        }
    }
}

/// Shared FIFO of events waiting to be dispatched.
///
/// Cloning yields another handle to the same queue. Callbacks that fire
/// while the control layer is busy only push here; the owner drains the
/// queue once it is free again.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    inner: Rc<RefCell<VecDeque<ViewerEvent>>>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: ViewerEvent) {
        self.inner.borrow_mut().push_back(event);
    }

    pub fn pop(&self) -> Option<ViewerEvent> {
        self.inner.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}
