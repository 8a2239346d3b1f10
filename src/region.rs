//! Viewer registrations and the markers they expose to stylesheets.

use crate::{HiddenGroups, InstanceId};

/// Class on every managed region.
pub const WRAP_CLASS: &str = "lcgp_wrap";
/// Prefix of the per-instance class (`lcgp_<id>`).
pub const INSTANCE_CLASS_PREFIX: &str = "lcgp_";
/// Class added once controls are attached.
pub const LOADED_CLASS: &str = "lcgp_loaded";
/// Class added when the engine cannot render the source.
pub const FALLBACK_CLASS: &str = "webp-jsplayer-fallback";
/// Attribute carrying the instance id.
pub const INSTANCE_ATTR: &str = "data-lcgp-inst";
/// Attribute carrying the source locator.
pub const SOURCE_ATTR: &str = "data-lcgp-src";
/// Image attribute naming the animated source, preferred over `src`.
pub const ANIMATED_SRC_ATTR: &str = "rel:animated_src";

/// Visible playback state of a region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ViewState {
    /// Nothing has been played yet, or playback was stopped
    #[default]
    Initial,
    Playing,
    Paused,
}

impl ViewState {
    /// Class a stylesheet keys off for this state.
    pub const fn class_name(self) -> &'static str {
        match self {
            ViewState::Initial => "lcgp_initialstate",
            ViewState::Playing => "lcgp_playing",
            ViewState::Paused => "lcgp_paused",
        }
    }
}

/// Where a region came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provenance {
    /// Matched by a caller's selector
    Page,
    /// Built inside the fullscreen overlay for `origin`
    FullscreenClone { origin: InstanceId },
}

/// Everything needed to register one region.
#[derive(Clone, Debug)]
pub struct Registration {
    pub source: String,
    pub autoplay: bool,
    /// Caller classes kept on the region alongside the markers
    pub classes: Vec<String>,
    pub hidden: HiddenGroups,
    pub provenance: Provenance,
}

/// One managed viewer region (the "wrap").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    id: InstanceId,
    source: String,
    pub(crate) state: ViewState,
    pub(crate) loaded: bool,
    pub(crate) supported: bool,
    autoplay: bool,
    classes: Vec<String>,
    hidden: HiddenGroups,
    provenance: Provenance,
}

impl Region {
    pub(crate) fn new(id: InstanceId, registration: Registration) -> Self {
        Self {
            id,
            source: registration.source,
            state: ViewState::Initial,
            loaded: false,
            supported: true,
            autoplay: registration.autoplay,
            classes: registration.classes,
            hidden: registration.hidden,
            provenance: registration.provenance,
        }
    }

    #[inline]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Resource locator of the animated content.
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn state(&self) -> ViewState {
        self.state
    }

    #[inline]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Whether the engine reported the source as renderable.
    ///
    /// Stays `true` until loading completes.
    #[inline]
    pub fn is_supported(&self) -> bool {
        self.supported
    }

    #[inline]
    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    /// Caller classes, without any of the state markers.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn hidden(&self) -> &HiddenGroups {
        &self.hidden
    }

    #[inline]
    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    #[inline]
    pub fn is_fullscreen_clone(&self) -> bool {
        matches!(self.provenance, Provenance::FullscreenClone { .. })
    }

    /// Full class list the region should carry right now.
    ///
    /// ```rust
    /// use webp_player_ui::{HiddenGroups, InstanceId, Provenance, Region, Registration};
    ///
    /// let region = Region::registered(
    ///     InstanceId::new(3),
    ///     Registration {
    ///         source: "cat.webp".into(),
    ///         autoplay: false,
    ///         classes: vec!["gallery".into()],
    ///         hidden: HiddenGroups::none(),
    ///         provenance: Provenance::Page,
    ///     },
    /// );
    /// assert_eq!(
    ///     region.class_list(),
    ///     vec!["gallery", "lcgp_wrap", "lcgp_3", "lcgp_initialstate"]
    /// );
    /// ```
    pub fn class_list(&self) -> Vec<String> {
        let mut list = self.classes.clone();
        list.push(WRAP_CLASS.to_string());
        list.push(format!("{}{}", INSTANCE_CLASS_PREFIX, self.id));
        list.push(self.state.class_name().to_string());
        if self.loaded {
            list.push(LOADED_CLASS.to_string());
            if !self.supported {
                list.push(FALLBACK_CLASS.to_string());
            }
        }
        list
    }

    /// Attributes the region should carry.
    pub fn attributes(&self) -> [(&'static str, String); 2] {
        [
            (INSTANCE_ATTR, self.id.to_string()),
            (SOURCE_ATTR, self.source.clone()),
        ]
    }

    /// Build a region outside a registry, mostly for rendering previews.
    pub fn registered(id: InstanceId, registration: Registration) -> Self {
        Self::new(id, registration)
    }
}

/// Whether `class` is one of the markers this crate manages.
///
/// Used to keep markers from leaking into the caller classes copied onto a
/// fullscreen clone.
pub fn is_marker_class(class: &str) -> bool {
    const FIXED: [&str; 6] = [
        WRAP_CLASS,
        LOADED_CLASS,
        FALLBACK_CLASS,
        ViewState::Initial.class_name(),
        ViewState::Playing.class_name(),
        ViewState::Paused.class_name(),
    ];
    if FIXED.contains(&class) {
        return true;
    }
    class
        .strip_prefix(INSTANCE_CLASS_PREFIX)
        .is_some_and(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
}
