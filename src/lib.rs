//! # webp-player-ui
//!
//! Playback controls and state machine for animated-image viewers.
//!
//! This crate attaches a standard command bar (play, pause, stop, hold-to-step
//! prev/next, fullscreen) to animated-image regions in a document and drives
//! their visible state:
//! - Registering regions and owning one engine handle per region
//! - Building the command bar from a hidden-groups configuration
//! - The `Initial` / `Playing` / `Paused` state machine and press-and-hold stepping
//! - A singleton fullscreen overlay hosting an independent clone viewer
//!
//! The decoding engine and the document are collaborators behind the
//! [`FramePlayer`] and [`Page`] traits. [`HeadlessPlayer`], [`MemoryPage`] and
//! [`ManualScheduler`] give a complete in-process setup.
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for options and state
//! - `toml` - Parse [`PlayerOptions`] from TOML
//! - `web` - Enable the browser DOM binding (WASM)
//!
//! ## Example
//!
//! ```rust
//! use webp_player_ui::*;
//!
//! let mut page = MemoryPage::new(|_src: &str, autoplay| HeadlessPlayer::new(30).with_autoplay(autoplay));
//! page.add_region(&["gif"], Some(MediaElement::animated("dance.webp")));
//!
//! let mut viewers = Viewers::new(page, ManualScheduler::new());
//! let id = viewers.initialize_players(".gif", &PlayerOptions::new().hide(ControlGroup::Fullscreen))[0];
//!
//! // hold "next" for 350 ms
//! viewers.dispatch(ViewerEvent::MovePressed { instance: id, direction: Direction::Forward })?;
//! viewers.advance_clock(350);
//! viewers.dispatch(ViewerEvent::MoveReleased { instance: id })?;
//! assert_eq!(viewers.player(id)?.current_frame(), 4);
//! # Ok::<(), ControlError>(())
//! ```

mod controls;
mod error;
mod events;
mod headless;
pub mod overlay;
mod options;
mod page;
mod player;
pub mod region;
mod registry;
mod schedule;
mod viewers;

#[cfg(feature = "web")]
pub mod web;

pub use controls::{Affordance, CommandBar, COMMAND_BAR_CLASS};
pub use error::ControlError;
pub use events::{ClickTarget, Direction, EventQueue, ViewerEvent};
pub use headless::{HeadlessPlayer, LoadMode, PlayerCall};
pub use options::{ControlGroup, HiddenGroups, PlayerOptions};
pub use overlay::{FullscreenOverlay, OVERLAY_ID};
pub use page::{Candidate, MediaElement, MemoryNode, MemoryPage, NodeId, Page};
pub use player::{FramePlayer, ReadySignal};
pub use region::{Provenance, Region, Registration, ViewState};
pub use registry::{ContinuousMove, InstanceId, PlayerRegistry, Viewer};
pub use schedule::{ManualScheduler, Scheduler, TimerId, STEP_INTERVAL_MS};
pub use viewers::Viewers;

#[cfg(feature = "web")]
pub use web::webp_jsplayer_ui;
