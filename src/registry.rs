//! Owned mapping from instance id to viewer state.

use std::collections::BTreeMap;
use std::fmt;

use crate::{CommandBar, ControlError, Direction, Region, Registration, TimerId};

/// Integer id of a managed viewer. Allocated monotonically, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InstanceId(u32);

impl InstanceId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A press-and-hold step in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContinuousMove {
    pub timer: TimerId,
    pub direction: Direction,
}

/// Everything owned for one viewer: its page node, visible state, player
/// handle, command bar and running continuous move.
#[derive(Debug)]
pub struct Viewer<P, N> {
    pub(crate) node: N,
    pub(crate) region: Region,
    pub(crate) handle: P,
    pub(crate) controls: Option<CommandBar>,
    pub(crate) motion: Option<ContinuousMove>,
}

impl<P, N> Viewer<P, N> {
    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn handle(&self) -> &P {
        &self.handle
    }

    /// Controls attached after loading, `None` before.
    pub fn controls(&self) -> Option<&CommandBar> {
        self.controls.as_ref()
    }

    pub fn motion(&self) -> Option<ContinuousMove> {
        self.motion
    }
}

/// Registry of player handles keyed by [`InstanceId`].
///
/// ```rust
/// use webp_player_ui::{HiddenGroups, InstanceId, PlayerRegistry, Provenance, Registration};
///
/// let mut registry: PlayerRegistry<&str, ()> = PlayerRegistry::new();
/// let reg = |src: &str| Registration {
///     source: src.into(),
///     autoplay: false,
///     classes: Vec::new(),
///     hidden: HiddenGroups::none(),
///     provenance: Provenance::Page,
/// };
///
/// let a = registry.register((), reg("a.webp"), "handle-a");
/// let b = registry.register((), reg("b.webp"), "handle-b");
/// assert_eq!((a.get(), b.get()), (0, 1));
/// assert_eq!(*registry.handle(b).unwrap(), "handle-b");
/// assert!(registry.handle(InstanceId::new(7)).is_err());
/// ```
#[derive(Debug)]
pub struct PlayerRegistry<P, N> {
    next_id: u32,
    viewers: BTreeMap<InstanceId, Viewer<P, N>>,
}

impl<P, N> Default for PlayerRegistry<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P, N> PlayerRegistry<P, N> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            viewers: BTreeMap::new(),
        }
    }

    /// Store a new viewer and return its freshly allocated id.
    pub fn register(&mut self, node: N, registration: Registration, handle: P) -> InstanceId {
        let id = InstanceId(self.next_id);
        self.next_id += 1;
        self.viewers.insert(
            id,
            Viewer {
                node,
                region: Region::new(id, registration),
                handle,
                controls: None,
                motion: None,
            },
        );
        id
    }

    pub fn get(&self, id: InstanceId) -> Result<&Viewer<P, N>, ControlError> {
        self.viewers.get(&id).ok_or(ControlError::Unregistered(id))
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Result<&mut Viewer<P, N>, ControlError> {
        self.viewers.get_mut(&id).ok_or(ControlError::Unregistered(id))
    }

    pub fn handle(&self, id: InstanceId) -> Result<&P, ControlError> {
        self.get(id).map(|viewer| &viewer.handle)
    }

    pub fn handle_mut(&mut self, id: InstanceId) -> Result<&mut P, ControlError> {
        self.get_mut(id).map(|viewer| &mut viewer.handle)
    }

    /// Drop a viewer, handing back what it owned so the caller can cancel
    /// its timer. Only fullscreen clones are ever released.
    pub(crate) fn release(&mut self, id: InstanceId) -> Result<Viewer<P, N>, ControlError> {
        self.viewers.remove(&id).ok_or(ControlError::Unregistered(id))
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.viewers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }

    /// Ids of live viewers in allocation order.
    pub fn ids(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.viewers.keys().copied()
    }
}
