//! Fullscreen overlay manager.
//!
//! At most one overlay exists at a time. It hosts a clone of the origin
//! region that is registered through the same path as page regions, but
//! with its own handle, its own state machine and no fullscreen controls.
//! Opening while an overlay is already up replaces it.

use crate::{
    Affordance, ControlError, ControlGroup, HiddenGroups, InstanceId, Page, PlayerOptions,
    Provenance, Scheduler, Viewers,
};

/// Fixed id of the overlay container.
pub const OVERLAY_ID: &str = "lcgp_fs_wrap";

/// Affordances the overlay container provides itself.
pub const OVERLAY_CHROME: [Affordance; 1] = [Affordance::ExitFullscreen];

/// The open overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FullscreenOverlay {
    origin: InstanceId,
    source: String,
    clone: Option<InstanceId>,
}

impl FullscreenOverlay {
    /// The region fullscreen was entered from.
    pub fn origin(&self) -> InstanceId {
        self.origin
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The viewer registered inside the overlay. `None` only if the clone
    /// failed to register.
    pub fn clone_id(&self) -> Option<InstanceId> {
        self.clone
    }
}

/// Options the clone is registered with.
fn clone_options() -> PlayerOptions {
    PlayerOptions {
        autoplay: true,
        additional_class: None,
        hidden: HiddenGroups::only(ControlGroup::Fullscreen),
    }
}

impl<P: Page, S: Scheduler> Viewers<P, S> {
    /// The open overlay, if any.
    pub fn overlay(&self) -> Option<&FullscreenOverlay> {
        self.overlay.as_ref()
    }

    /// Pause the origin, then show it fullscreen.
    pub(crate) fn enter_fullscreen(&mut self, origin: InstanceId) -> Result<(), ControlError> {
        self.pause(origin)?;
        let region = self.region(origin)?;
        let source = region.source().to_string();
        let classes = region.classes().to_vec();
        self.open_overlay(origin, source, classes)
    }

    fn open_overlay(
        &mut self,
        origin: InstanceId,
        source: String,
        inherited: Vec<String>,
    ) -> Result<(), ControlError> {
        if let Some(previous) = self.overlay.as_ref().map(|overlay| overlay.origin) {
            tracing::debug!(origin = %previous, "replacing open overlay");
            self.close_overlay();
        }

        let mut nested = self.page.mount_overlay(&source)?;
        for class in inherited {
            if !nested.classes.contains(&class) {
                nested.classes.push(class);
            }
        }

        let ids = self.register_all(
            vec![nested],
            &clone_options(),
            Provenance::FullscreenClone { origin },
        );
        let clone = ids.first().copied();
        tracing::debug!(origin = %origin, clone = ?clone, "fullscreen overlay opened");
        self.overlay = Some(FullscreenOverlay {
            origin,
            source,
            clone,
        });
        Ok(())
    }

    /// Tear the overlay down, releasing the clone's handle and timer.
    ///
    /// Returns `false` when no overlay was open.
    pub fn close_overlay(&mut self) -> bool {
        let Some(overlay) = self.overlay.take() else {
            return false;
        };

        if let Some(clone) = overlay.clone {
            match self.registry.release(clone) {
                Ok(viewer) => {
                    if let Some(motion) = viewer.motion {
                        self.scheduler.clear_interval(motion.timer);
                    }
                }
                Err(err) => tracing::warn!(error = %err, "overlay clone already gone"),
            }
        }
        self.page.unmount_overlay();
        tracing::debug!(origin = %overlay.origin, "fullscreen overlay closed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Candidate, CommandBar, Direction, HeadlessPlayer, ManualScheduler, MediaElement,
        MemoryPage, NodeId, PlayerCall, Region, ViewState, ViewerEvent,
    };

    /// A document whose body cannot take the overlay.
    struct NoOverlayPage(MemoryPage<HeadlessPlayer>);

    impl Page for NoOverlayPage {
        type Node = NodeId;
        type Player = HeadlessPlayer;

        fn select(&self, selector: &str) -> Vec<Candidate<NodeId>> {
            self.0.select(selector)
        }

        fn create_player(
            &mut self,
            node: &NodeId,
            source: &str,
            autoplay: bool,
        ) -> Result<HeadlessPlayer, ControlError> {
            self.0.create_player(node, source, autoplay)
        }

        fn render_region(&mut self, node: &NodeId, region: &Region) {
            self.0.render_region(node, region);
        }

        fn attach_controls(&mut self, node: &NodeId, instance: InstanceId, controls: &CommandBar) {
            self.0.attach_controls(node, instance, controls);
        }

        fn mount_overlay(&mut self, _source: &str) -> Result<Candidate<NodeId>, ControlError> {
            Err(ControlError::Page("document has no body".into()))
        }

        fn unmount_overlay(&mut self) {
            self.0.unmount_overlay();
        }
    }

    type TestViewers = Viewers<MemoryPage<HeadlessPlayer>, ManualScheduler>;

    fn setup() -> (TestViewers, InstanceId) {
        let mut page = MemoryPage::new(|_src: &str, autoplay| {
            HeadlessPlayer::new(8).with_autoplay(autoplay)
        });
        page.add_region(&["gif", "hero"], Some(MediaElement::animated("cat.webp")));
        let mut viewers = Viewers::new(page, ManualScheduler::new());
        let id = viewers.initialize_players(".gif", &PlayerOptions::new().additional_class("shown"))[0];
        (viewers, id)
    }

    fn enter(viewers: &mut TestViewers, id: InstanceId) {
        viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: id,
                affordance: Affordance::EnterFullscreen,
            })
            .unwrap();
    }

    #[test]
    fn enter_pauses_origin_and_builds_clone() {
        let (mut viewers, id) = setup();
        viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: id,
                affordance: Affordance::Play,
            })
            .unwrap();
        enter(&mut viewers, id);

        assert_eq!(viewers.region(id).unwrap().state(), ViewState::Paused);
        assert!(!viewers.player(id).unwrap().is_playing());

        let overlay = viewers.overlay().unwrap().clone();
        assert_eq!(overlay.origin(), id);
        assert_eq!(overlay.source(), "cat.webp");

        let clone = overlay.clone_id().unwrap();
        let region = viewers.region(clone).unwrap();
        assert_eq!(region.source(), "cat.webp");
        assert!(region.autoplay());
        assert!(region.is_fullscreen_clone());
        assert_eq!(region.state(), ViewState::Playing);
        assert_eq!(region.classes(), &["gif", "hero", "shown"]);

        let controls = viewers.controls(clone).unwrap();
        assert!(!controls.contains(Affordance::EnterFullscreen));
        assert!(!controls.contains(Affordance::ExitFullscreen));
        assert!(controls.contains(Affordance::Next));
    }

    #[test]
    fn overlay_is_in_document() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let container = viewers.page().overlay().unwrap();
        let node = viewers.page().node(container);
        assert_eq!(node.id.as_deref(), Some(OVERLAY_ID));
        assert_eq!(node.chrome, OVERLAY_CHROME.to_vec());
        assert_eq!(viewers.page().children(container).len(), 1);
    }

    #[test]
    fn escape_closes_then_is_noop() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let clone = viewers.overlay().unwrap().clone_id().unwrap();

        let escape = ViewerEvent::KeyDown { key: "Escape".into() };
        viewers.dispatch(escape.clone()).unwrap();
        assert!(viewers.overlay().is_none());
        assert!(viewers.page().overlay().is_none());
        assert!(!viewers.registry().contains(clone));

        viewers.dispatch(escape).unwrap();
        assert!(viewers.overlay().is_none());
        assert_eq!(viewers.region(id).unwrap().state(), ViewState::Paused);
    }

    #[test]
    fn other_keys_do_not_close() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        viewers
            .dispatch(ViewerEvent::KeyDown { key: "Enter".into() })
            .unwrap();
        assert!(viewers.overlay().is_some());
        viewers
            .dispatch(ViewerEvent::KeyDown { key: "Esc".into() })
            .unwrap();
        assert!(viewers.overlay().is_none());
    }

    #[test]
    fn only_background_clicks_close() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        viewers
            .dispatch(ViewerEvent::OverlayClicked { on_background: false })
            .unwrap();
        assert!(viewers.overlay().is_some());
        viewers
            .dispatch(ViewerEvent::OverlayClicked { on_background: true })
            .unwrap();
        assert!(viewers.overlay().is_none());
    }

    #[test]
    fn exit_affordances_close() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        viewers.dispatch(ViewerEvent::OverlayExitClicked).unwrap();
        assert!(viewers.overlay().is_none());

        enter(&mut viewers, id);
        viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: id,
                affordance: Affordance::ExitFullscreen,
            })
            .unwrap();
        assert!(viewers.overlay().is_none());
    }

    #[test]
    fn reopening_replaces_the_overlay() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let first = viewers.overlay().unwrap().clone_id().unwrap();
        enter(&mut viewers, id);
        let second = viewers.overlay().unwrap().clone_id().unwrap();

        assert_ne!(first, second);
        assert!(!viewers.registry().contains(first));
        assert_eq!(
            viewers
                .page()
                .attached()
                .filter(|(_, node)| node.id.as_deref() == Some(OVERLAY_ID))
                .count(),
            1
        );
    }

    #[test]
    fn closing_cancels_clone_timer() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let clone = viewers.overlay().unwrap().clone_id().unwrap();
        viewers
            .dispatch(ViewerEvent::MovePressed {
                instance: clone,
                direction: Direction::Forward,
            })
            .unwrap();
        assert_eq!(viewers.scheduler().active(), 1);

        assert!(viewers.close_overlay());
        assert_eq!(viewers.scheduler().active(), 0);
        assert!(!viewers.close_overlay());
    }

    #[test]
    fn clone_cannot_enter_fullscreen() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let clone = viewers.overlay().unwrap().clone_id().unwrap();
        let err = viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: clone,
                affordance: Affordance::EnterFullscreen,
            })
            .unwrap_err();
        assert!(matches!(err, ControlError::AffordanceHidden { .. }));
        assert_eq!(viewers.overlay().unwrap().clone_id(), Some(clone));
    }

    #[test]
    fn failed_mount_reaches_the_caller() {
        let mut inner = MemoryPage::new(|_src: &str, _autoplay| HeadlessPlayer::new(4));
        inner.add_region(&["gif"], Some(MediaElement::new("cat.webp")));
        let mut viewers = Viewers::new(NoOverlayPage(inner), ManualScheduler::new());
        let id = viewers.initialize_players(".gif", &PlayerOptions::new())[0];

        let err = viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: id,
                affordance: Affordance::EnterFullscreen,
            })
            .unwrap_err();
        assert_eq!(err, ControlError::Page("document has no body".into()));
        assert!(viewers.overlay().is_none());
        assert_eq!(viewers.registry().len(), 1);
        assert_eq!(viewers.region(id).unwrap().state(), ViewState::Paused);
    }

    #[test]
    fn caller_lcgp_classes_reach_the_clone() {
        let mut page = MemoryPage::new(|_src: &str, autoplay| {
            HeadlessPlayer::new(8).with_autoplay(autoplay)
        });
        page.add_region(&["gif", "lcgp_custom"], Some(MediaElement::animated("cat.webp")));
        let mut viewers = Viewers::new(page, ManualScheduler::new());
        let id = viewers.initialize_players(".gif", &PlayerOptions::new())[0];
        enter(&mut viewers, id);

        let clone = viewers.overlay().unwrap().clone_id().unwrap();
        assert_eq!(viewers.region(clone).unwrap().classes(), &["gif", "lcgp_custom"]);
    }

    #[test]
    fn clone_is_independent_of_origin() {
        let (mut viewers, id) = setup();
        enter(&mut viewers, id);
        let clone = viewers.overlay().unwrap().clone_id().unwrap();
        viewers
            .dispatch(ViewerEvent::AffordanceClicked {
                instance: clone,
                affordance: Affordance::Stop,
            })
            .unwrap();
        assert_eq!(viewers.region(clone).unwrap().state(), ViewState::Initial);
        assert_eq!(viewers.region(id).unwrap().state(), ViewState::Paused);
        assert_eq!(viewers.player(id).unwrap().count(PlayerCall::MoveTo(0)), 0);
    }
}
