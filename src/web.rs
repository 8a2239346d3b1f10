//! Browser binding.
//!
//! Wires the control layer to the live DOM: regions are found with
//! `querySelectorAll`, engine handles are `SuperWebP` instances from the
//! page, and every listener or timer callback posts a [`ViewerEvent`] to the
//! shared queue, then drains it. A page-global host owns the [`Viewers`],
//! so repeated calls of the entry point share one registry and one overlay.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlImageElement, KeyboardEvent, Window};

use crate::overlay::{OVERLAY_CHROME, OVERLAY_ID};
use crate::region::{is_marker_class, ANIMATED_SRC_ATTR, INSTANCE_ATTR, WRAP_CLASS};
use crate::{
    Affordance, Candidate, ClickTarget, CommandBar, ControlError, Direction, EventQueue,
    FramePlayer, HiddenGroups, InstanceId, MediaElement, Page, PlayerOptions, ReadySignal,
    Region, Scheduler, TimerId, ViewerEvent, Viewers, COMMAND_BAR_CLASS,
};

#[wasm_bindgen]
extern "C" {
    /// The page's decoding/rendering engine.
    type SuperWebP;

    #[wasm_bindgen(constructor, catch)]
    fn new(options: &JsValue) -> Result<SuperWebP, JsValue>;

    #[wasm_bindgen(method)]
    fn load(this: &SuperWebP, callback: &JsValue);

    #[wasm_bindgen(method)]
    fn play(this: &SuperWebP);

    #[wasm_bindgen(method)]
    fn pause(this: &SuperWebP);

    #[wasm_bindgen(method)]
    fn move_to(this: &SuperWebP, frame: u32);

    #[wasm_bindgen(method)]
    fn move_relative(this: &SuperWebP, delta: i32);

    #[wasm_bindgen(method, getter)]
    fn supported(this: &SuperWebP) -> JsValue;
}

/// A `SuperWebP` instance seen through [`FramePlayer`].
pub struct WebpHandle {
    inner: SuperWebP,
}

impl fmt::Debug for WebpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebpHandle").finish_non_exhaustive()
    }
}

impl FramePlayer for WebpHandle {
    fn play(&mut self) {
        self.inner.play();
    }

    fn pause(&mut self) {
        self.inner.pause();
    }

    fn move_to(&mut self, frame: usize) {
        self.inner.move_to(u32::try_from(frame).unwrap_or(u32::MAX));
    }

    fn move_relative(&mut self, delta: i32) {
        self.inner.move_relative(delta);
    }

    fn supported(&self) -> bool {
        self.inner.supported().as_bool().unwrap_or(false)
    }

    fn load(&mut self, ready: ReadySignal) {
        let callback = Closure::once_into_js(move || {
            ready.fire();
            // let the engine finish its own callback before we react
            wasm_bindgen_futures::spawn_local(async { pump_host() });
        });
        self.inner.load(&callback);
    }
}

type DomViewers = Viewers<DomPage, DomScheduler>;
type Listener = Closure<dyn FnMut(Event)>;

thread_local! {
    static HOST: RefCell<Option<DomViewers>> = const { RefCell::new(None) };
}

/// Drain the host's queue unless it is already busy; a busy host drains
/// the queue itself before returning.
fn pump_host() {
    HOST.with(|host| {
        if let Ok(mut guard) = host.try_borrow_mut() {
            if let Some(viewers) = guard.as_mut() {
                viewers.pump();
            }
        }
    });
}

fn post(queue: &EventQueue, event: ViewerEvent) {
    queue.push(event);
    pump_host();
}

fn event_element(event: &Event) -> Option<Element> {
    event.target().and_then(|target| target.dyn_into::<Element>().ok())
}

fn affordance_of(element: &Element) -> Option<Affordance> {
    let classes = element.class_list();
    (0..classes.length())
        .filter_map(|i| classes.item(i))
        .find_map(|class| Affordance::from_class(&class))
}

fn media_of(region: &Element) -> Option<MediaElement> {
    let img = region.query_selector("img").ok().flatten()?;
    let src = match img.dyn_ref::<HtmlImageElement>() {
        Some(image) => image.src(),
        None => img.get_attribute("src").unwrap_or_default(),
    };
    Some(MediaElement {
        animated_src: img.get_attribute(ANIMATED_SRC_ATTR),
        src,
    })
}

/// The live document.
pub struct DomPage {
    document: Document,
    queue: EventQueue,
    overlay: Option<Element>,
    /// Listeners on nodes inside the overlay, dropped with it
    overlay_listeners: Vec<Listener>,
}

impl fmt::Debug for DomPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomPage")
            .field("overlay", &self.overlay.is_some())
            .field("overlay_listeners", &self.overlay_listeners.len())
            .finish_non_exhaustive()
    }
}

impl DomPage {
    /// Bind to `document` and start listening for Escape.
    pub fn new(document: Document, queue: EventQueue) -> Result<Self, JsValue> {
        let keys = queue.clone();
        let on_key = Listener::wrap(Box::new(move |event: Event| {
            if let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) {
                post(&keys, ViewerEvent::KeyDown { key });
            }
        }) as Box<dyn FnMut(Event)>);
        document.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
        on_key.forget();

        Ok(Self {
            document,
            queue,
            overlay: None,
            overlay_listeners: Vec::new(),
        })
    }

    fn in_overlay(&self, node: &Element) -> bool {
        self.overlay
            .as_ref()
            .is_some_and(|overlay| overlay.contains(Some(node.as_ref())))
    }

    fn listen<F>(&mut self, target: &Element, kind: &str, handler: F) -> Result<(), JsValue>
    where
        F: FnMut(Event) + 'static,
    {
        let listener = Listener::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target.add_event_listener_with_callback(kind, listener.as_ref().unchecked_ref())?;
        if self.in_overlay(target) {
            self.overlay_listeners.push(listener);
        } else {
            // page regions live as long as the page
            listener.forget();
        }
        Ok(())
    }

    fn create_affordance(&self, affordance: Affordance) -> Result<Element, JsValue> {
        let span = self.document.create_element("span")?;
        span.set_class_name(affordance.class_name());
        span.set_attribute("title", affordance.title())?;
        Ok(span)
    }

    fn build_controls(&mut self, node: &Element, instance: InstanceId, controls: &CommandBar) -> Result<(), JsValue> {
        let bar = self.document.create_element("div")?;
        bar.set_class_name(COMMAND_BAR_CLASS);
        for affordance in controls.affordances() {
            let span = self.create_affordance(*affordance)?;
            bar.append_child(&span)?;
        }
        node.append_child(&bar)?;

        let queue = self.queue.clone();
        let cmd = bar.clone();
        self.listen(node, "click", move |event| {
            let Some(target) = event_element(&event) else {
                return;
            };
            let event = if cmd.contains(Some(target.as_ref())) {
                match ViewerEvent::bar_click(instance, affordance_of(&target)) {
                    Some(event) => event,
                    None => return,
                }
            } else {
                let target = if target.tag_name().eq_ignore_ascii_case("canvas") {
                    ClickTarget::Surface
                } else {
                    ClickTarget::Other
                };
                ViewerEvent::RegionClicked { instance, target }
            };
            post(&queue, event);
        })?;

        for (kind, pressed) in [("mousedown", true), ("mouseup", false)] {
            let queue = self.queue.clone();
            let cmd = bar.clone();
            self.listen(node, kind, move |event| {
                let Some(target) = event_element(&event) else {
                    return;
                };
                if !cmd.contains(Some(target.as_ref())) {
                    return;
                }
                let direction = match affordance_of(&target) {
                    Some(Affordance::Prev) => Direction::Backward,
                    Some(Affordance::Next) => Direction::Forward,
                    _ => return,
                };
                let event = if pressed {
                    ViewerEvent::MovePressed {
                        instance,
                        direction,
                    }
                } else {
                    ViewerEvent::MoveReleased { instance }
                };
                post(&queue, event);
            })?;
        }
        Ok(())
    }

    fn build_overlay(&mut self, source: &str) -> Result<Element, JsValue> {
        let body = self
            .document
            .body()
            .ok_or_else(|| JsValue::from_str("document has no body"))?;

        let container = self.document.create_element("div")?;
        container.set_id(OVERLAY_ID);
        let nested = self.document.create_element("div")?;
        let img = self.document.create_element("img")?;
        img.set_attribute("src", "")?;
        img.set_attribute(ANIMATED_SRC_ATTR, source)?;
        nested.append_child(&img)?;
        container.append_child(&nested)?;
        for affordance in OVERLAY_CHROME {
            let exit = self.create_affordance(affordance)?;
            container.append_child(&exit)?;
        }
        body.append_child(&container)?;
        self.overlay = Some(container.clone());

        let queue = self.queue.clone();
        self.listen(&container, "click", move |event| {
            let Some(target) = event_element(&event) else {
                return;
            };
            if target.id() == OVERLAY_ID {
                post(&queue, ViewerEvent::OverlayClicked { on_background: true });
            } else if affordance_of(&target) == Some(Affordance::ExitFullscreen)
                && target.parent_element().is_some_and(|parent| parent.id() == OVERLAY_ID)
            {
                post(&queue, ViewerEvent::OverlayExitClicked);
            }
        })?;
        Ok(nested)
    }
}

impl Page for DomPage {
    type Node = Element;
    type Player = WebpHandle;

    fn select(&self, selector: &str) -> Vec<Candidate<Element>> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(err) => {
                tracing::warn!(selector, ?err, "invalid selector");
                return Vec::new();
            }
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|node| Candidate {
                media: media_of(&node),
                managed: node.class_list().contains(WRAP_CLASS) || node.has_attribute(INSTANCE_ATTR),
                classes: node
                    .class_name()
                    .split_whitespace()
                    .map(String::from)
                    .collect(),
                node,
            })
            .collect()
    }

    fn create_player(&mut self, node: &Element, source: &str, autoplay: bool) -> Result<WebpHandle, ControlError> {
        let img = node
            .query_selector("img")
            .ok()
            .flatten()
            .ok_or(ControlError::MissingMedia)?;

        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"webp".into(), &img)
            .and_then(|_| js_sys::Reflect::set(&options, &"auto_play".into(), &autoplay.into()))
            .map_err(|err| ControlError::Engine(format!("{err:?}")))?;

        let inner = SuperWebP::new(&options).map_err(|err| ControlError::Engine(format!("{err:?}")))?;
        tracing::debug!(source, autoplay, "created SuperWebP handle");
        Ok(WebpHandle { inner })
    }

    fn render_region(&mut self, node: &Element, region: &Region) {
        let wanted = region.class_list();
        let classes = node.class_list();
        let stale: Vec<String> = (0..classes.length())
            .filter_map(|i| classes.item(i))
            .filter(|class| is_marker_class(class) && !wanted.contains(class))
            .collect();

        // a rejected token leaves the others in place
        for class in &stale {
            if let Err(err) = classes.remove_1(class) {
                tracing::warn!(instance = %region.id(), class = %class, ?err, "failed to remove marker");
            }
        }
        for class in &wanted {
            if let Err(err) = classes.add_1(class) {
                tracing::warn!(instance = %region.id(), class = %class, ?err, "failed to add class");
            }
        }
        for (name, value) in region.attributes() {
            if let Err(err) = node.set_attribute(name, &value) {
                tracing::warn!(instance = %region.id(), name, ?err, "failed to set attribute");
            }
        }
    }

    fn attach_controls(&mut self, node: &Element, instance: InstanceId, controls: &CommandBar) {
        if let Err(err) = self.build_controls(node, instance, controls) {
            tracing::warn!(%instance, ?err, "failed to attach controls");
        }
    }

    fn mount_overlay(&mut self, source: &str) -> Result<Candidate<Element>, ControlError> {
        self.unmount_overlay();
        let nested = self
            .build_overlay(source)
            .map_err(|err| ControlError::Page(format!("{err:?}")))?;
        Ok(Candidate {
            node: nested,
            media: Some(MediaElement::animated(source)),
            classes: Vec::new(),
            managed: false,
        })
    }

    fn unmount_overlay(&mut self) {
        if let Some(container) = self.overlay.take() {
            container.remove();
            self.overlay_listeners.clear();
        }
    }
}

/// Repeating timers on `window.setInterval`.
pub struct DomScheduler {
    window: Window,
    queue: EventQueue,
    next_id: u64,
    timers: HashMap<TimerId, (i32, Closure<dyn FnMut()>)>,
}

impl fmt::Debug for DomScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomScheduler")
            .field("timers", &self.timers.len())
            .finish_non_exhaustive()
    }
}

impl DomScheduler {
    pub fn new(window: Window, queue: EventQueue) -> Self {
        Self {
            window,
            queue,
            next_id: 0,
            timers: HashMap::new(),
        }
    }
}

impl Scheduler for DomScheduler {
    fn set_interval(&mut self, instance: InstanceId, period_ms: u32) -> TimerId {
        let timer = TimerId::new(self.next_id);
        self.next_id += 1;

        let queue = self.queue.clone();
        let callback = Closure::wrap(Box::new(move || {
            post(&queue, ViewerEvent::Tick { instance, timer });
        }) as Box<dyn FnMut()>);
        let period = i32::try_from(period_ms).unwrap_or(i32::MAX);
        match self
            .window
            .set_interval_with_callback_and_timeout_and_arguments_0(callback.as_ref().unchecked_ref(), period)
        {
            Ok(handle) => {
                self.timers.insert(timer, (handle, callback));
            }
            Err(err) => tracing::warn!(%instance, ?err, "setInterval failed"),
        }
        timer
    }

    fn clear_interval(&mut self, timer: TimerId) {
        if let Some((handle, _callback)) = self.timers.remove(&timer) {
            self.window.clear_interval_with_handle(handle);
        }
    }
}

fn create_host() -> Result<DomViewers, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document available"))?;
    let queue = EventQueue::new();
    let page = DomPage::new(document, queue.clone())?;
    let scheduler = DomScheduler::new(window, queue.clone());
    Ok(Viewers::with_queue(page, scheduler, queue))
}

/// Register every region matching `selector` on the live page.
pub fn initialize_players(selector: &str, options: &PlayerOptions) -> Result<Vec<InstanceId>, JsValue> {
    HOST.with(|host| {
        let mut guard = host
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("players are already being initialized"))?;
        if guard.is_none() {
            *guard = Some(create_host()?);
        }
        match guard.as_mut() {
            Some(viewers) => Ok(viewers.initialize_players(selector, options)),
            None => Err(JsValue::from_str("player host unavailable")),
        }
    })
}

/// JavaScript entry point, call-compatible with the LC GIF Player plugin:
/// `webp_jsplayer_ui(selector, autoplay, addit_class, to_hide)`.
#[wasm_bindgen]
pub fn webp_jsplayer_ui(
    selector: &str,
    autoplay: bool,
    addit_class: Option<String>,
    to_hide: Option<js_sys::Array>,
) -> Result<Vec<u32>, JsValue> {
    let mut options = PlayerOptions::new().autoplay(autoplay);
    if let Some(class) = addit_class.filter(|class| !class.trim().is_empty()) {
        options = options.additional_class(class);
    }
    if let Some(tokens) = to_hide {
        options.hidden = HiddenGroups::from_tokens(tokens.iter().filter_map(|token| token.as_string()));
    }
    let ids = initialize_players(selector, &options)?;
    Ok(ids.into_iter().map(InstanceId::get).collect())
}
