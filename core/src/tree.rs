use crate::backend::{NativeView, ViewManager, ViewManagerError};
use crate::ids::{ReactTag, SurfaceId};
use crate::mount::MountItem;
use crate::registry::Catalog;
use crate::value::Props;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;

/// Where a mounted tag lives.
#[derive(Clone)]
pub struct TagEntry {
    pub surface: SurfaceId,
    pub manager: Arc<dyn ViewManager>,
}

/// A concurrently readable index of mounted tags.
///
/// Only the [`NativeTree`] writes to it; any thread may read.
#[derive(Default)]
pub struct TagIndex {
    entries: RwLock<HashMap<ReactTag, TagEntry>>,
}

impl TagIndex {
    pub fn new() -> TagIndex {
        TagIndex::default()
    }

    pub fn resolve(&self, tag: ReactTag) -> Option<TagEntry> {
        self.entries.read().get(&tag).cloned()
    }

    pub fn contains(&self, tag: ReactTag) -> bool {
        self.entries.read().contains_key(&tag)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Errors that may occur when applying a mount item.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("no view with tag {0}")]
    NoSuchView(ReactTag),
    #[error("tag {0} is already mounted")]
    DuplicateTag(ReactTag),
    #[error("view {0}: no view manager named {1:?}")]
    UnknownViewManager(ReactTag, String),
    #[error("view {0} belongs to surface {1}")]
    WrongSurface(ReactTag, SurfaceId),
    #[error("view {0} is not a child of {1:?}")]
    NotAChild(ReactTag, Option<ReactTag>),
    #[error("attaching {0} would create a cycle")]
    Cycle(ReactTag),
    #[error("view {tag}: {error}")]
    View {
        tag: ReactTag,
        error: ViewManagerError,
    },
}

struct Node {
    surface: SurfaceId,
    view: Box<dyn NativeView>,
    parent: Option<ReactTag>,
    children: Vec<ReactTag>,
}

/// The native-view tree: every mounted native view, by tag.
///
/// The tree belongs to the UI thread; the bridge only hands it to UI-confined code.
pub struct NativeTree {
    nodes: HashMap<ReactTag, Node>,
    roots: HashMap<SurfaceId, Vec<ReactTag>>,
    index: Arc<TagIndex>,
}

impl NativeTree {
    pub fn new(index: Arc<TagIndex>) -> NativeTree {
        NativeTree {
            nodes: HashMap::new(),
            roots: HashMap::new(),
            index,
        }
    }

    /// Applies a mount item on behalf of `surface`.
    pub fn patch(
        &mut self,
        surface: SurfaceId,
        item: MountItem,
        catalog: &Catalog,
    ) -> Result<(), PatchError> {
        match item {
            MountItem::Create {
                tag,
                view_manager,
                props,
            } => self.create_view(surface, tag, &view_manager, &props, catalog),
            MountItem::UpdateProps { tag, props } => {
                self.owned_by(surface, tag)?;
                self.with_view(tag, |view| view.update_props(&props))
            }
            MountItem::Insert {
                parent,
                child,
                index,
            } => self.insert(surface, parent, child, index),
            MountItem::Remove { parent, child } => {
                self.owned_by(surface, child)?;
                let current = self.nodes[&child].parent;
                if current != parent || (parent.is_none() && !self.is_root(surface, child)) {
                    return Err(PatchError::NotAChild(child, parent));
                }
                self.detach(surface, child)
            }
            MountItem::Delete { tag } => {
                self.owned_by(surface, tag)?;
                self.detach(surface, tag)?;
                self.remove_view(tag);
                Ok(())
            }
        }
    }

    pub fn contains(&self, tag: ReactTag) -> bool {
        self.nodes.contains_key(&tag)
    }

    pub fn surface_of(&self, tag: ReactTag) -> Option<SurfaceId> {
        self.nodes.get(&tag).map(|node| node.surface)
    }

    /// Child tags of `parent`, or of the surface root if `parent` is `None`.
    pub fn children(&self, surface: SurfaceId, parent: Option<ReactTag>) -> Vec<ReactTag> {
        match parent {
            Some(parent) => self
                .nodes
                .get(&parent)
                .map(|node| node.children.clone())
                .unwrap_or_default(),
            None => self.roots.get(&surface).cloned().unwrap_or_default(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs `f` on a view, converting both errors and panics into a [`PatchError`].
    pub fn with_view<R>(
        &mut self,
        tag: ReactTag,
        f: impl FnOnce(&mut dyn NativeView) -> Result<R, ViewManagerError>,
    ) -> Result<R, PatchError> {
        let node = self
            .nodes
            .get_mut(&tag)
            .ok_or(PatchError::NoSuchView(tag))?;
        guarded(tag, || f(&mut *node.view))
    }

    /// Forgets every view of a surface.
    ///
    /// Views are dropped without being called into; the host has already detached them.
    /// Returns the number of views released.
    pub fn remove_surface(&mut self, surface: SurfaceId) -> usize {
        self.roots.remove(&surface);
        let tags: Vec<ReactTag> = self
            .nodes
            .iter()
            .filter(|(_, node)| node.surface == surface)
            .map(|(tag, _)| *tag)
            .collect();
        let mut index = self.index.entries.write();
        for tag in &tags {
            self.nodes.remove(tag);
            index.remove(tag);
        }
        tags.len()
    }

    fn create_view(
        &mut self,
        surface: SurfaceId,
        tag: ReactTag,
        view_manager: &str,
        props: &Props,
        catalog: &Catalog,
    ) -> Result<(), PatchError> {
        if self.nodes.contains_key(&tag) {
            return Err(PatchError::DuplicateTag(tag));
        }
        let manager = catalog
            .get(view_manager)
            .ok_or_else(|| PatchError::UnknownViewManager(tag, view_manager.to_owned()))?;
        let view = guarded(tag, || manager.create_view(tag, props))?;

        self.nodes.insert(
            tag,
            Node {
                surface,
                view,
                parent: None,
                children: Vec::new(),
            },
        );
        self.index.entries.write().insert(
            tag,
            TagEntry {
                surface,
                manager: Arc::clone(manager),
            },
        );
        Ok(())
    }

    fn owned_by(&self, surface: SurfaceId, tag: ReactTag) -> Result<(), PatchError> {
        match self.nodes.get(&tag) {
            Some(node) if node.surface == surface => Ok(()),
            Some(node) => Err(PatchError::WrongSurface(tag, node.surface)),
            None => Err(PatchError::NoSuchView(tag)),
        }
    }

    fn is_root(&self, surface: SurfaceId, tag: ReactTag) -> bool {
        self.roots
            .get(&surface)
            .map_or(false, |roots| roots.contains(&tag))
    }

    fn insert(
        &mut self,
        surface: SurfaceId,
        parent: Option<ReactTag>,
        child: ReactTag,
        index: usize,
    ) -> Result<(), PatchError> {
        self.owned_by(surface, child)?;
        if let Some(parent) = parent {
            self.owned_by(surface, parent)?;
            // the child may not be the parent or one of its ancestors
            let mut cursor = Some(parent);
            while let Some(tag) = cursor {
                if tag == child {
                    return Err(PatchError::Cycle(child));
                }
                cursor = self.nodes.get(&tag).and_then(|node| node.parent);
            }
        }

        self.detach(surface, child)?;

        let Some(parent) = parent else {
            let roots = self.roots.entry(surface).or_default();
            roots.insert(index.min(roots.len()), child);
            return Ok(());
        };

        // take the parent out so the backend can see parent and child at the same time
        let mut parent_node = match self.nodes.remove(&parent) {
            Some(node) => node,
            None => return Err(PatchError::NoSuchView(parent)),
        };
        let index = index.min(parent_node.children.len());
        let result = match self.nodes.get(&child) {
            Some(child_node) => {
                let child_view = &*child_node.view;
                guarded(parent, || parent_node.view.insert_child(index, child_view))
            }
            None => Err(PatchError::NoSuchView(child)),
        };
        if result.is_ok() {
            parent_node.children.insert(index, child);
        }
        self.nodes.insert(parent, parent_node);
        result?;

        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detaches a view from whatever it’s attached to. Does nothing for unattached views.
    fn detach(&mut self, surface: SurfaceId, tag: ReactTag) -> Result<(), PatchError> {
        let parent = match self.nodes.get(&tag) {
            Some(node) => node.parent,
            None => return Err(PatchError::NoSuchView(tag)),
        };

        let Some(parent) = parent else {
            if let Some(roots) = self.roots.get_mut(&surface) {
                roots.retain(|root| *root != tag);
            }
            return Ok(());
        };

        let mut parent_node = match self.nodes.remove(&parent) {
            Some(node) => node,
            None => return Err(PatchError::NoSuchView(parent)),
        };
        let result = match parent_node.children.iter().position(|c| *c == tag) {
            Some(index) => {
                let child_view = &*self.nodes[&tag].view;
                let result = guarded(parent, || parent_node.view.remove_child(index, child_view));
                // bookkeeping follows the engine even if the native view complained
                parent_node.children.remove(index);
                result
            }
            None => Ok(()),
        };
        self.nodes.insert(parent, parent_node);
        if let Some(node) = self.nodes.get_mut(&tag) {
            node.parent = None;
        }
        result
    }

    /// Removes a view and its subviews.
    ///
    /// Does *not* remove the view from its parent’s children.
    fn remove_view(&mut self, tag: ReactTag) {
        if let Some(node) = self.nodes.remove(&tag) {
            self.index.entries.write().remove(&tag);
            for child in node.children {
                self.remove_view(child);
            }
        }
    }
}

/// Calls into native code, turning a panic into an error.
fn guarded<R>(
    tag: ReactTag,
    f: impl FnOnce() -> Result<R, ViewManagerError>,
) -> Result<R, PatchError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(error)) => Err(PatchError::View { tag, error }),
        Err(payload) => Err(PatchError::View {
            tag,
            error: ViewManagerError::Panicked(panic_message(&*payload)),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
