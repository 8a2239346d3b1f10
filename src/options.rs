//! Entry-point configuration.

use std::collections::BTreeSet;
use std::str::FromStr;

/// A group of optional affordances that can be left out of a command bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ControlGroup {
    /// Prev / next stepping
    Move,
    /// Enter / exit fullscreen
    Fullscreen,
}

impl ControlGroup {
    /// Token used by the browser entry point (`"move"`, `"fullscreen"`).
    pub fn token(self) -> &'static str {
        match self {
            ControlGroup::Move => "move",
            ControlGroup::Fullscreen => "fullscreen",
        }
    }
}

impl FromStr for ControlGroup {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "move" => Ok(ControlGroup::Move),
            "fullscreen" => Ok(ControlGroup::Fullscreen),
            _ => Err(()),
        }
    }
}

/// The set of control groups to omit when building a command bar.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct HiddenGroups(BTreeSet<ControlGroup>);

impl HiddenGroups {
    /// No hidden groups: every affordance is built.
    pub fn none() -> Self {
        Self::default()
    }

    /// Hide a single group.
    pub fn only(group: ControlGroup) -> Self {
        let mut hidden = Self::default();
        hidden.insert(group);
        hidden
    }

    /// Parse the string tokens accepted by the browser entry point.
    ///
    /// Unknown tokens are ignored.
    ///
    /// ```rust
    /// use webp_player_ui::{ControlGroup, HiddenGroups};
    ///
    /// let hidden = HiddenGroups::from_tokens(["move", "sparkles"]);
    /// assert!(hidden.contains(ControlGroup::Move));
    /// assert!(!hidden.contains(ControlGroup::Fullscreen));
    /// ```
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hidden = Self::default();
        for token in tokens {
            match token.as_ref().parse::<ControlGroup>() {
                Ok(group) => hidden.insert(group),
                Err(()) => tracing::debug!(token = token.as_ref(), "ignoring unknown control group"),
            }
        }
        hidden
    }

    /// Add a group to the set.
    pub fn insert(&mut self, group: ControlGroup) {
        self.0.insert(group);
    }

    /// Whether `group` is hidden.
    #[inline]
    pub fn contains(&self, group: ControlGroup) -> bool {
        self.0.contains(&group)
    }

    /// Iterate the hidden groups in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = ControlGroup> + '_ {
        self.0.iter().copied()
    }
}

/// Options for one call of the registration entry point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerOptions {
    /// Start playback as soon as the handle has loaded.
    pub autoplay: bool,
    /// Extra class names added to every registered region, separated by
    /// whitespace as in a `class` attribute.
    pub additional_class: Option<String>,
    /// Control groups left out of the command bar.
    pub hidden: HiddenGroups,
}

impl PlayerOptions {
    /// Options with autoplay off, no extra class, every control shown.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn additional_class(mut self, class: impl Into<String>) -> Self {
        self.additional_class = Some(class.into());
        self
    }

    pub fn hide(mut self, group: ControlGroup) -> Self {
        self.hidden.insert(group);
        self
    }

    /// Parse options from a TOML document.
    ///
    /// ```toml
    /// autoplay = true
    /// additional_class = "gallery"
    /// hidden = ["move"]
    /// ```
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_case_insensitive() {
        let hidden = HiddenGroups::from_tokens(["Move", " FULLSCREEN "]);
        assert!(hidden.contains(ControlGroup::Move));
        assert!(hidden.contains(ControlGroup::Fullscreen));
        assert_eq!(hidden.iter().count(), 2);
    }

    #[test]
    fn builder_setters() {
        let opts = PlayerOptions::new()
            .autoplay(true)
            .additional_class("gallery")
            .hide(ControlGroup::Fullscreen);
        assert!(opts.autoplay);
        assert_eq!(opts.additional_class.as_deref(), Some("gallery"));
        assert_eq!(opts.hidden, HiddenGroups::only(ControlGroup::Fullscreen));
    }

    #[test]
    fn default_hides_nothing() {
        let opts = PlayerOptions::default();
        assert!(!opts.autoplay);
        assert!(!opts.hidden.contains(ControlGroup::Move));
        assert!(!opts.hidden.contains(ControlGroup::Fullscreen));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn parse_toml() {
        let opts = PlayerOptions::from_toml_str(
            "autoplay = true\nadditional_class = \"gallery\"\nhidden = [\"move\"]\n",
        )
        .unwrap();
        assert!(opts.autoplay);
        assert_eq!(opts.additional_class.as_deref(), Some("gallery"));
        assert!(opts.hidden.contains(ControlGroup::Move));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn parse_empty_toml_uses_defaults() {
        let opts = PlayerOptions::from_toml_str("").unwrap();
        assert_eq!(opts, PlayerOptions::default());
    }
}
