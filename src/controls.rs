//! Control builder: which affordances a region gets, and attaching them.

use crate::{
    ControlError, ControlGroup, FramePlayer, HiddenGroups, InstanceId, Page, Scheduler, Viewers,
};

/// Class of the command container inserted into each region.
///
/// The misspelling is part of the stylesheet contract.
pub const COMMAND_BAR_CLASS: &str = "lcpg_cmd";

/// One clickable control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Affordance {
    Play,
    Pause,
    Stop,
    Prev,
    Next,
    EnterFullscreen,
    ExitFullscreen,
}

impl Affordance {
    /// Every affordance, in command bar order.
    pub const ALL: [Affordance; 7] = [
        Affordance::Play,
        Affordance::Pause,
        Affordance::Stop,
        Affordance::Prev,
        Affordance::Next,
        Affordance::EnterFullscreen,
        Affordance::ExitFullscreen,
    ];

    /// Class identifying this affordance.
    pub fn class_name(self) -> &'static str {
        match self {
            Affordance::Play => "lcgp_play",
            Affordance::Pause => "lcgp_pause",
            Affordance::Stop => "lcgp_stop",
            Affordance::Prev => "lcgp_prev",
            Affordance::Next => "lcgp_next",
            Affordance::EnterFullscreen => "lcgp_enter_fs",
            Affordance::ExitFullscreen => "lcgp_exit_fs",
        }
    }

    /// Tooltip text.
    pub fn title(self) -> &'static str {
        match self {
            Affordance::Play => "play",
            Affordance::Pause => "pause",
            Affordance::Stop => "back to beginning",
            Affordance::Prev => "hold to move backward",
            Affordance::Next => "hold to move forward",
            Affordance::EnterFullscreen => "enter fullscreen",
            Affordance::ExitFullscreen => "exit fullscreen",
        }
    }

    /// The optional group this affordance belongs to; `None` for the
    /// always-present play/pause/stop.
    pub fn group(self) -> Option<ControlGroup> {
        match self {
            Affordance::Play | Affordance::Pause | Affordance::Stop => None,
            Affordance::Prev | Affordance::Next => Some(ControlGroup::Move),
            Affordance::EnterFullscreen | Affordance::ExitFullscreen => {
                Some(ControlGroup::Fullscreen)
            }
        }
    }

    /// Look an affordance up by its class name.
    pub fn from_class(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.class_name() == class)
    }
}

/// The command container built for one region.
///
/// A structured description; the page collaborator turns it into elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandBar {
    affordances: Vec<Affordance>,
}

impl CommandBar {
    /// Build the command bar, omitting every hidden group.
    ///
    /// ```rust
    /// use webp_player_ui::{Affordance, CommandBar, ControlGroup, HiddenGroups};
    ///
    /// let bar = CommandBar::build(&HiddenGroups::only(ControlGroup::Move));
    /// assert!(bar.contains(Affordance::Play));
    /// assert!(bar.contains(Affordance::EnterFullscreen));
    /// assert!(!bar.contains(Affordance::Next));
    /// ```
    pub fn build(hidden: &HiddenGroups) -> Self {
        let affordances = Affordance::ALL
            .into_iter()
            .filter(|a| a.group().map_or(true, |group| !hidden.contains(group)))
            .collect();
        Self { affordances }
    }

    pub fn contains(&self, affordance: Affordance) -> bool {
        self.affordances.contains(&affordance)
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    pub fn len(&self) -> usize {
        self.affordances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affordances.is_empty()
    }
}

impl<P: Page, S: Scheduler> Viewers<P, S> {
    /// Insert the command bar into a loaded region and mark it loaded
    /// (and unsupported, if the engine says so).
    pub(crate) fn attach_controls(&mut self, id: InstanceId) -> Result<(), ControlError> {
        let viewer = self.registry.get_mut(id)?;
        let bar = CommandBar::build(viewer.region.hidden());
        self.page.attach_controls(&viewer.node, id, &bar);
        viewer.controls = Some(bar);

        viewer.region.loaded = true;
        viewer.region.supported = viewer.handle.supported();
        if !viewer.region.supported {
            tracing::debug!(instance = %id, source = viewer.region.source(), "source not supported, using fallback");
        }
        self.page.render_region(&viewer.node, &viewer.region);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bar_by_default() {
        let bar = CommandBar::build(&HiddenGroups::none());
        assert_eq!(bar.affordances(), &Affordance::ALL);
    }

    #[test]
    fn hide_fullscreen() {
        let bar = CommandBar::build(&HiddenGroups::only(ControlGroup::Fullscreen));
        assert_eq!(
            bar.affordances(),
            &[
                Affordance::Play,
                Affordance::Pause,
                Affordance::Stop,
                Affordance::Prev,
                Affordance::Next
            ]
        );
    }

    #[test]
    fn hide_everything_optional() {
        let hidden = HiddenGroups::from_tokens(["move", "fullscreen"]);
        let bar = CommandBar::build(&hidden);
        assert_eq!(bar.len(), 3);
        assert!(bar.contains(Affordance::Stop));
        assert!(!bar.contains(Affordance::Prev));
        assert!(!bar.contains(Affordance::ExitFullscreen));
    }

    #[test]
    fn class_names_round_trip() {
        for affordance in Affordance::ALL {
            assert_eq!(Affordance::from_class(affordance.class_name()), Some(affordance));
        }
        assert_eq!(Affordance::from_class("lcgp_wrap"), None);
    }
}
