use crate::ids::ReactTag;
use crate::value::Props;

/// One instruction for the native tree.
///
/// A `parent` of `None` addresses the surface root.
#[derive(Debug, Clone, PartialEq)]
pub enum MountItem {
    /// Creates a view with the named view manager.
    Create {
        tag: ReactTag,
        view_manager: String,
        props: Props,
    },
    /// Applies a property diff to an existing view.
    UpdateProps { tag: ReactTag, props: Props },
    /// Attaches a view to a parent at the given index.
    ///
    /// A view that already has a parent is detached first.
    Insert {
        parent: Option<ReactTag>,
        child: ReactTag,
        index: usize,
    },
    /// Detaches a view from its parent without deleting it.
    Remove {
        parent: Option<ReactTag>,
        child: ReactTag,
    },
    /// Deletes a view and all of its descendants.
    Delete { tag: ReactTag },
}

impl MountItem {
    /// The tag this item primarily targets.
    pub fn tag(&self) -> ReactTag {
        match self {
            MountItem::Create { tag, .. }
            | MountItem::UpdateProps { tag, .. }
            | MountItem::Delete { tag } => *tag,
            MountItem::Insert { child, .. } | MountItem::Remove { child, .. } => *child,
        }
    }
}
