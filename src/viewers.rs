//! Registration entry point and the per-region state machine.

use std::fmt;

use crate::overlay::FullscreenOverlay;
use crate::region::is_marker_class;
use crate::{
    Affordance, Candidate, ClickTarget, CommandBar, ContinuousMove, ControlError, Direction,
    EventQueue, FramePlayer, InstanceId, ManualScheduler, Page, PlayerOptions, PlayerRegistry,
    Provenance, ReadySignal, Region, Registration, Scheduler, TimerId, ViewState, ViewerEvent,
    STEP_INTERVAL_MS,
};

/// Owner of every managed viewer on a page.
///
/// All input arrives as [`ViewerEvent`]s through [`dispatch`](Self::dispatch)
/// or the shared [`EventQueue`]. Each event runs to completion before the
/// next is taken, so handlers always see a consistent state.
///
/// ## Example
///
/// ```rust
/// use webp_player_ui::*;
///
/// let mut page = MemoryPage::new(|_src: &str, _autoplay| HeadlessPlayer::new(24));
/// page.add_region(&["gif"], Some(MediaElement::new("cat.webp")));
///
/// let mut viewers = Viewers::new(page, ManualScheduler::new());
/// let id = viewers.initialize_players(".gif", &PlayerOptions::default())[0];
/// assert_eq!(viewers.region(id)?.state(), ViewState::Initial);
///
/// viewers.dispatch(ViewerEvent::AffordanceClicked { instance: id, affordance: Affordance::Play })?;
/// assert_eq!(viewers.region(id)?.state(), ViewState::Playing);
///
/// viewers.dispatch(ViewerEvent::AffordanceClicked { instance: id, affordance: Affordance::Stop })?;
/// assert_eq!(viewers.region(id)?.state(), ViewState::Initial);
/// assert_eq!(viewers.player(id)?.current_frame(), 0);
/// # Ok::<(), ControlError>(())
/// ```
pub struct Viewers<P: Page, S: Scheduler> {
    pub(crate) page: P,
    pub(crate) scheduler: S,
    pub(crate) registry: PlayerRegistry<P::Player, P::Node>,
    pub(crate) overlay: Option<FullscreenOverlay>,
    queue: EventQueue,
}

impl<P: Page, S: Scheduler> fmt::Debug for Viewers<P, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Viewers")
            .field("viewers", &self.registry.len())
            .field("overlay", &self.overlay)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}

impl<P: Page, S: Scheduler> Viewers<P, S> {
    pub fn new(page: P, scheduler: S) -> Self {
        Self::with_queue(page, scheduler, EventQueue::new())
    }

    /// Use an existing queue, so collaborators created before the owner
    /// can already post events to it.
    pub fn with_queue(page: P, scheduler: S, queue: EventQueue) -> Self {
        Self {
            page,
            scheduler,
            registry: PlayerRegistry::new(),
            overlay: None,
            queue,
        }
    }

    /// Another handle to the event queue.
    pub fn queue(&self) -> EventQueue {
        self.queue.clone()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn registry(&self) -> &PlayerRegistry<P::Player, P::Node> {
        &self.registry
    }

    pub fn region(&self, id: InstanceId) -> Result<&Region, ControlError> {
        self.registry.get(id).map(|viewer| &viewer.region)
    }

    pub fn player(&self, id: InstanceId) -> Result<&P::Player, ControlError> {
        self.registry.handle(id)
    }

    pub fn player_mut(&mut self, id: InstanceId) -> Result<&mut P::Player, ControlError> {
        self.registry.handle_mut(id)
    }

    /// The command bar of a loaded viewer.
    pub fn controls(&self, id: InstanceId) -> Result<&CommandBar, ControlError> {
        self.registry
            .get(id)?
            .controls()
            .ok_or(ControlError::NotLoaded(id))
    }

    /// The running continuous move of a viewer, if any.
    pub fn motion(&self, id: InstanceId) -> Result<Option<ContinuousMove>, ControlError> {
        self.registry.get(id).map(|viewer| viewer.motion)
    }

    /// Register every region matching `selector`.
    ///
    /// Regions without a renderable image are skipped; a region that fails
    /// never keeps the others from registering. Returns the new ids in
    /// document order. Loads that complete synchronously are processed
    /// before this returns.
    pub fn initialize_players(&mut self, selector: &str, options: &PlayerOptions) -> Vec<InstanceId> {
        let candidates = self.page.select(selector);
        tracing::debug!(selector, matched = candidates.len(), "initializing players");
        let ids = self.register_all(candidates, options, Provenance::Page);
        self.pump();
        ids
    }

    pub(crate) fn register_all(
        &mut self,
        candidates: Vec<Candidate<P::Node>>,
        options: &PlayerOptions,
        provenance: Provenance,
    ) -> Vec<InstanceId> {
        let mut ids = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.register(candidate, options, provenance) {
                Ok(id) => ids.push(id),
                Err(err) => tracing::debug!(error = %err, "skipping region"),
            }
        }
        ids
    }

    fn register(
        &mut self,
        candidate: Candidate<P::Node>,
        options: &PlayerOptions,
        provenance: Provenance,
    ) -> Result<InstanceId, ControlError> {
        if candidate.managed {
            return Err(ControlError::AlreadyRegistered);
        }
        let source = candidate
            .media
            .as_ref()
            .and_then(|media| media.source_reference())
            .ok_or(ControlError::MissingMedia)?
            .to_string();

        let mut classes: Vec<String> = candidate
            .classes
            .into_iter()
            .filter(|class| !is_marker_class(class))
            .collect();
        let extras = options.additional_class.iter().flat_map(|extra| extra.split_whitespace());
        for extra in extras {
            if !classes.iter().any(|class| class == extra) {
                classes.push(extra.to_string());
            }
        }

        let handle = self.page.create_player(&candidate.node, &source, options.autoplay)?;
        let id = self.registry.register(
            candidate.node,
            Registration {
                source,
                autoplay: options.autoplay,
                classes,
                hidden: options.hidden.clone(),
                provenance,
            },
            handle,
        );

        let viewer = self.registry.get_mut(id)?;
        self.page.render_region(&viewer.node, &viewer.region);
        tracing::debug!(instance = %id, source = viewer.region.source(), ?provenance, "registered viewer");
        viewer.handle.load(ReadySignal::new(id, self.queue.clone()));
        Ok(id)
    }

    /// Handle one event, then everything it queued.
    ///
    /// The result is that of `event` itself; failures of queued follow-up
    /// events are logged.
    pub fn dispatch(&mut self, event: ViewerEvent) -> Result<(), ControlError> {
        let result = self.handle(event);
        self.pump();
        result
    }

    /// Drain the event queue.
    pub fn pump(&mut self) {
        while let Some(event) = self.queue.pop() {
            if let Err(err) = self.handle(event) {
                tracing::warn!(error = %err, "queued event failed");
            }
        }
    }

    fn handle(&mut self, event: ViewerEvent) -> Result<(), ControlError> {
        tracing::trace!(?event, "handling event");
        match event {
            ViewerEvent::Loaded(id) => self.on_loaded(id),
            ViewerEvent::RegionClicked { instance, target } => {
                if self.ready(instance)? {
                    self.on_region_click(instance, target)?;
                }
                Ok(())
            }
            ViewerEvent::AffordanceClicked {
                instance,
                affordance,
            } => {
                if self.ready(instance)? {
                    self.on_affordance(instance, affordance)?;
                }
                Ok(())
            }
            ViewerEvent::MovePressed {
                instance,
                direction,
            } => {
                if self.ready(instance)? {
                    self.require(instance, direction.affordance())?;
                    self.start_move(instance, direction)?;
                }
                Ok(())
            }
            ViewerEvent::MoveReleased { instance } => {
                if self.ready(instance)? {
                    self.stop_move(instance)?;
                }
                Ok(())
            }
            ViewerEvent::Tick { instance, timer } => self.on_tick(instance, timer),
            ViewerEvent::OverlayClicked { on_background } => {
                if on_background {
                    self.close_overlay();
                }
                Ok(())
            }
            ViewerEvent::OverlayExitClicked => {
                self.close_overlay();
                Ok(())
            }
            ViewerEvent::KeyDown { key } => {
                if matches!(key.as_str(), "Escape" | "Esc") {
                    self.close_overlay();
                }
                Ok(())
            }
        }
    }

    /// Whether the viewer has controls yet. Input for a viewer that is
    /// still loading is dropped.
    fn ready(&self, id: InstanceId) -> Result<bool, ControlError> {
        let loaded = self.registry.get(id)?.region.loaded;
        if !loaded {
            tracing::debug!(instance = %id, "ignoring input before load");
        }
        Ok(loaded)
    }

    fn require(&self, id: InstanceId, affordance: Affordance) -> Result<(), ControlError> {
        let present = self
            .registry
            .get(id)?
            .controls
            .as_ref()
            .is_some_and(|bar| bar.contains(affordance));
        if present {
            Ok(())
        } else {
            Err(ControlError::AffordanceHidden {
                instance: id,
                affordance,
            })
        }
    }

    fn on_loaded(&mut self, id: InstanceId) -> Result<(), ControlError> {
        let viewer = self.registry.get(id)?;
        if viewer.region.loaded {
            tracing::warn!(instance = %id, "duplicate load completion ignored");
            return Ok(());
        }
        let autoplay = viewer.region.autoplay();

        self.attach_controls(id)?;
        tracing::debug!(instance = %id, autoplay, "controls attached");
        if autoplay {
            self.play(id)?;
        }
        Ok(())
    }

    fn on_region_click(&mut self, id: InstanceId, target: ClickTarget) -> Result<(), ControlError> {
        match (self.region(id)?.state(), target) {
            (ViewState::Initial, _) => self.play(id),
            (ViewState::Paused, ClickTarget::Surface) => self.play(id),
            (ViewState::Playing, ClickTarget::Surface) => self.pause(id),
            (_, ClickTarget::Other) => Ok(()),
        }
    }

    fn on_affordance(&mut self, id: InstanceId, affordance: Affordance) -> Result<(), ControlError> {
        self.require(id, affordance)?;
        match affordance {
            Affordance::Play => self.play(id),
            Affordance::Pause => self.pause(id),
            Affordance::Stop => self.stop(id),
            // stepping is driven by press/release, not click
            Affordance::Prev | Affordance::Next => Ok(()),
            Affordance::EnterFullscreen => self.enter_fullscreen(id),
            Affordance::ExitFullscreen => {
                self.close_overlay();
                Ok(())
            }
        }
    }

    fn transition(&mut self, id: InstanceId, state: ViewState) -> Result<(), ControlError> {
        let viewer = self.registry.get_mut(id)?;
        viewer.region.state = state;
        self.page.render_region(&viewer.node, &viewer.region);
        Ok(())
    }

    pub(crate) fn play(&mut self, id: InstanceId) -> Result<(), ControlError> {
        self.registry.handle_mut(id)?.play();
        self.transition(id, ViewState::Playing)
    }

    pub(crate) fn pause(&mut self, id: InstanceId) -> Result<(), ControlError> {
        self.registry.handle_mut(id)?.pause();
        self.transition(id, ViewState::Paused)
    }

    fn stop(&mut self, id: InstanceId) -> Result<(), ControlError> {
        let handle = self.registry.handle_mut(id)?;
        handle.pause();
        handle.move_to(0);
        self.transition(id, ViewState::Initial)
    }

    /// Halt playback, step once, then keep stepping every
    /// [`STEP_INTERVAL_MS`] until released. The visible state is unchanged.
    fn start_move(&mut self, id: InstanceId, direction: Direction) -> Result<(), ControlError> {
        let viewer = self.registry.get_mut(id)?;
        if let Some(previous) = viewer.motion.take() {
            self.scheduler.clear_interval(previous.timer);
        }

        viewer.handle.pause();
        viewer.handle.move_relative(direction.delta());
        let timer = self.scheduler.set_interval(id, STEP_INTERVAL_MS);
        viewer.motion = Some(ContinuousMove { timer, direction });
        tracing::trace!(instance = %id, ?direction, %timer, "continuous move started");
        Ok(())
    }

    fn stop_move(&mut self, id: InstanceId) -> Result<(), ControlError> {
        if let Some(motion) = self.registry.get_mut(id)?.motion.take() {
            self.scheduler.clear_interval(motion.timer);
            tracing::trace!(instance = %id, timer = %motion.timer, "continuous move stopped");
        }
        Ok(())
    }

    fn on_tick(&mut self, id: InstanceId, timer: TimerId) -> Result<(), ControlError> {
        let viewer = self.registry.get_mut(id)?;
        match viewer.motion {
            Some(motion) if motion.timer == timer => {
                viewer.handle.move_relative(motion.direction.delta());
            }
            _ => {
                tracing::debug!(instance = %id, %timer, "stale timer cancelled");
                self.scheduler.clear_interval(timer);
            }
        }
        Ok(())
    }
}

impl<P: Page> Viewers<P, ManualScheduler> {
    /// Advance the virtual clock by `ms`, dispatching every tick that falls
    /// due in timestamp order.
    pub fn advance_clock(&mut self, ms: u64) {
        let until = self.scheduler.now_ms() + ms;
        while let Some((instance, timer)) = self.scheduler.pop_due(until) {
            if let Err(err) = self.dispatch(ViewerEvent::Tick { instance, timer }) {
                tracing::warn!(error = %err, "timer tick failed");
            }
        }
        self.scheduler.settle(until);
    }
}
