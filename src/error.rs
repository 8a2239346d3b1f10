//! Error type for control operations.

use crate::{Affordance, InstanceId};

/// Errors raised by the control layer.
///
/// Every failure is local to one viewer: the entry point logs and skips
/// a failing region, and event dispatch reports the error to the caller
/// without touching other instances.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// A matched region has no renderable image child.
    #[error("region has no renderable media")]
    MissingMedia,

    /// A matched region is already managed by an earlier registration.
    #[error("region is already registered")]
    AlreadyRegistered,

    /// An action referenced an instance id that was never registered
    /// (or whose fullscreen clone has already been released).
    #[error("no viewer registered with id {0}")]
    Unregistered(InstanceId),

    /// An event targeted an affordance the region's command bar omits.
    #[error("viewer {instance} has no {affordance:?} control")]
    AffordanceHidden {
        instance: InstanceId,
        affordance: Affordance,
    },

    /// The page could not perform a document operation.
    #[error("page operation failed: {0}")]
    Page(String),

    /// The decoding engine refused to create a handle.
    #[error("engine unavailable: {0}")]
    Engine(String),

    /// Controls were looked up for a viewer whose handle has not loaded.
    #[error("viewer {0} has not finished loading")]
    NotLoaded(InstanceId),
}
