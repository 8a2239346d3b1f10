//! Document collaborator and an in-memory document.
//!
//! The control layer never touches markup directly. Everything it needs
//! from the document (finding regions, creating engine handles, inserting
//! controls, reflecting state markers, mounting the overlay) goes through
//! [`Page`]. [`MemoryPage`] is a small in-process document for native
//! hosts and tests; the `web` feature provides a browser implementation.

use std::collections::BTreeMap;
use std::fmt;

use crate::overlay::{OVERLAY_CHROME, OVERLAY_ID};
use crate::region::{INSTANCE_ATTR, WRAP_CLASS};
use crate::{Affordance, CommandBar, ControlError, FramePlayer, InstanceId, Region};

/// The image-like child a region renders from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MediaElement {
    /// Value of the `rel:animated_src` attribute, when present
    pub animated_src: Option<String>,
    /// The element's own `src`
    pub src: String,
}

impl MediaElement {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            animated_src: None,
            src: src.into(),
        }
    }

    pub fn animated(animated_src: impl Into<String>) -> Self {
        Self {
            animated_src: Some(animated_src.into()),
            src: String::new(),
        }
    }

    /// Source locator: the animated attribute when non-empty, else `src`.
    ///
    /// ```rust
    /// use webp_player_ui::MediaElement;
    ///
    /// let img = MediaElement { animated_src: Some(String::new()), src: "still.webp".into() };
    /// assert_eq!(img.source_reference(), Some("still.webp"));
    /// assert_eq!(MediaElement::default().source_reference(), None);
    /// ```
    pub fn source_reference(&self) -> Option<&str> {
        self.animated_src
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(Some(self.src.as_str()))
            .filter(|s| !s.is_empty())
    }
}

/// A node matched by a selector, with what the entry point needs from it.
#[derive(Clone, Debug)]
pub struct Candidate<N> {
    pub node: N,
    /// `None` when the node holds no renderable child
    pub media: Option<MediaElement>,
    /// Classes already on the node
    pub classes: Vec<String>,
    /// The node already carries a registration's markers
    pub managed: bool,
}

/// Side of the document the control layer talks to.
pub trait Page {
    /// Handle to a node in the document.
    type Node: Clone + fmt::Debug;
    /// Engine handle created for each region.
    type Player: FramePlayer;

    /// Nodes matching `selector`, in document order.
    fn select(&self, selector: &str) -> Vec<Candidate<Self::Node>>;

    /// Create an engine handle for the region at `node`.
    fn create_player(
        &mut self,
        node: &Self::Node,
        source: &str,
        autoplay: bool,
    ) -> Result<Self::Player, ControlError>;

    /// Reflect the region's classes and attributes onto its node.
    fn render_region(&mut self, node: &Self::Node, region: &Region);

    /// Insert a command bar into the region at `node` and route its input
    /// back as events for `instance`.
    fn attach_controls(&mut self, node: &Self::Node, instance: InstanceId, controls: &CommandBar);

    /// Create the overlay with a nested region for `source`; returns that
    /// nested region.
    fn mount_overlay(&mut self, source: &str) -> Result<Candidate<Self::Node>, ControlError>;

    /// Remove the overlay subtree. No-op when none is mounted.
    fn unmount_overlay(&mut self);
}

/// Index of a node in a [`MemoryPage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// A node in a [`MemoryPage`].
#[derive(Clone, Debug, Default)]
pub struct MemoryNode {
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub media: Option<MediaElement>,
    /// Command bar inserted by the control layer
    pub controls: Option<CommandBar>,
    /// Chrome affordances owned by the node itself (the overlay's exit)
    pub chrome: Vec<Affordance>,
    pub parent: Option<NodeId>,
    /// Detached nodes are no longer part of the document.
    pub detached: bool,
}

impl MemoryNode {
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    fn matches(&self, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            self.has_class(class)
        } else if let Some(id) = selector.strip_prefix('#') {
            self.id.as_deref() == Some(id)
        } else {
            false
        }
    }
}

type PlayerFactory<P> = Box<dyn FnMut(&str, bool) -> P>;

/// In-memory document.
///
/// Regions are added up front; selectors support a single `.class` or
/// `#id`. Engine handles come from the factory closure.
///
/// ```rust
/// use webp_player_ui::{HeadlessPlayer, ManualScheduler, MediaElement, MemoryPage, PlayerOptions, Viewers};
///
/// let mut page = MemoryPage::new(|_src: &str, autoplay| HeadlessPlayer::new(12).with_autoplay(autoplay));
/// let node = page.add_region(&["gif"], Some(MediaElement::new("cat.webp")));
///
/// let mut viewers = Viewers::new(page, ManualScheduler::new());
/// let ids = viewers.initialize_players(".gif", &PlayerOptions::default());
/// assert_eq!(ids.len(), 1);
/// assert!(viewers.page().node(node).has_class("lcgp_loaded"));
/// ```
pub struct MemoryPage<P> {
    nodes: Vec<MemoryNode>,
    overlay: Option<NodeId>,
    factory: PlayerFactory<P>,
}

impl<P> fmt::Debug for MemoryPage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPage")
            .field("nodes", &self.nodes)
            .field("overlay", &self.overlay)
            .finish_non_exhaustive()
    }
}

impl<P: FramePlayer> MemoryPage<P> {
    pub fn new<F>(factory: F) -> Self
    where
        F: FnMut(&str, bool) -> P + 'static,
    {
        Self {
            nodes: Vec::new(),
            overlay: None,
            factory: Box::new(factory),
        }
    }

    /// Append a region node with the given classes and optional image child.
    pub fn add_region(&mut self, classes: &[&str], media: Option<MediaElement>) -> NodeId {
        self.push(MemoryNode {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            media,
            ..Default::default()
        })
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Look a node up. Detached nodes stay readable.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this page.
    pub fn node(&self, id: NodeId) -> &MemoryNode {
        &self.nodes[id.0]
    }

    /// The overlay container, while mounted.
    pub fn overlay(&self) -> Option<NodeId> {
        self.overlay
    }

    /// Nodes still attached to the document.
    pub fn attached(&self) -> impl Iterator<Item = (NodeId, &MemoryNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| !node.detached)
            .map(|(i, node)| (NodeId(i), node))
    }

    /// Attached children of `parent`.
    pub fn children(&self, parent: NodeId) -> Vec<NodeId> {
        self.attached()
            .filter(|(_, node)| node.parent == Some(parent))
            .map(|(id, _)| id)
            .collect()
    }
}

impl<P: FramePlayer> Page for MemoryPage<P> {
    type Node = NodeId;
    type Player = P;

    fn select(&self, selector: &str) -> Vec<Candidate<NodeId>> {
        self.attached()
            .filter(|(_, node)| node.matches(selector.trim()))
            .map(|(id, node)| Candidate {
                node: id,
                media: node.media.clone(),
                classes: node.classes.clone(),
                managed: node.has_class(WRAP_CLASS) || node.attribute(INSTANCE_ATTR).is_some(),
            })
            .collect()
    }

    fn create_player(&mut self, _node: &NodeId, source: &str, autoplay: bool) -> Result<P, ControlError> {
        Ok((self.factory)(source, autoplay))
    }

    fn render_region(&mut self, node: &NodeId, region: &Region) {
        let target = &mut self.nodes[node.0];
        target.classes = region.class_list();
        for (name, value) in region.attributes() {
            target.attributes.insert(name.to_string(), value);
        }
    }

    fn attach_controls(&mut self, node: &NodeId, _instance: InstanceId, controls: &CommandBar) {
        self.nodes[node.0].controls = Some(controls.clone());
    }

    fn mount_overlay(&mut self, source: &str) -> Result<Candidate<NodeId>, ControlError> {
        self.unmount_overlay();
        let container = self.push(MemoryNode {
            id: Some(OVERLAY_ID.to_string()),
            chrome: OVERLAY_CHROME.to_vec(),
            ..Default::default()
        });
        let nested = self.push(MemoryNode {
            media: Some(MediaElement::animated(source)),
            parent: Some(container),
            ..Default::default()
        });
        self.overlay = Some(container);
        Ok(Candidate {
            node: nested,
            media: self.nodes[nested.0].media.clone(),
            classes: Vec::new(),
            managed: false,
        })
    }

    fn unmount_overlay(&mut self) {
        let Some(container) = self.overlay.take() else {
            return;
        };
        for node in &mut self.nodes {
            if node.parent == Some(container) {
                node.detached = true;
            }
        }
        self.nodes[container.0].detached = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HeadlessPlayer, HiddenGroups, Provenance, Registration};

    fn page() -> MemoryPage<HeadlessPlayer> {
        MemoryPage::new(|_src: &str, _autoplay| HeadlessPlayer::new(4))
    }

    #[test]
    fn source_prefers_animated_attribute() {
        let img = MediaElement {
            animated_src: Some("anim.webp".into()),
            src: "still.png".into(),
        };
        assert_eq!(img.source_reference(), Some("anim.webp"));
        assert_eq!(MediaElement::new("still.png").source_reference(), Some("still.png"));
    }

    #[test]
    fn select_by_class_and_id() {
        let mut page = page();
        let a = page.add_region(&["gif", "hero"], Some(MediaElement::new("a.webp")));
        let _b = page.add_region(&["other"], None);

        let found = page.select(".gif");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].node, a);
        assert_eq!(found[0].classes, vec!["gif", "hero"]);
        assert!(page.select("#nope").is_empty());
        assert!(page.select("gif").is_empty());
        assert!(page.select("").is_empty());
    }

    #[test]
    fn overlay_mount_and_unmount() {
        let mut page = page();
        let nested = page.mount_overlay("big.webp").unwrap();
        let container = page.overlay().unwrap();

        assert_eq!(page.node(container).id.as_deref(), Some(OVERLAY_ID));
        assert_eq!(page.children(container), vec![nested.node]);
        assert_eq!(
            nested.media.as_ref().and_then(|m| m.source_reference()),
            Some("big.webp")
        );
        assert_eq!(page.select(&format!("#{OVERLAY_ID}")).len(), 1);

        page.unmount_overlay();
        assert!(page.overlay().is_none());
        assert!(page.node(container).detached);
        assert!(page.node(nested.node).detached);
        assert!(page.select(&format!("#{OVERLAY_ID}")).is_empty());

        // unmounting again is a no-op
        page.unmount_overlay();
    }

    #[test]
    fn render_region_writes_markers() {
        let mut page = page();
        let node = page.add_region(&["hero"], Some(MediaElement::new("a.webp")));
        let region = Region::registered(
            InstanceId::new(5),
            Registration {
                source: "a.webp".into(),
                autoplay: false,
                classes: vec!["hero".into()],
                hidden: HiddenGroups::none(),
                provenance: Provenance::Page,
            },
        );
        page.render_region(&node, &region);

        let rendered = page.node(node);
        assert!(rendered.has_class("hero"));
        assert!(rendered.has_class("lcgp_5"));
        assert!(rendered.has_class("lcgp_initialstate"));
        assert_eq!(rendered.attribute("data-lcgp-inst"), Some("5"));
        assert_eq!(rendered.attribute("data-lcgp-src"), Some("a.webp"));
    }
}
