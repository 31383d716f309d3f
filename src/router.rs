//! Resolving view-targeted operations and applying them to the native tree.

use crate::error::{BridgeError, Target};
use crate::surface::{Surface, SurfaceRegistry};
use std::sync::Arc;
use surface_bridge_core::{
    CommandId, CommandSpec, NativeTree, NativeView, Props, ReactTag, TagEntry, TagIndex, Value,
    ViewManagerError,
};

/// Props that would need a layout pass to take effect.
const LAYOUT_PROPS: &[&str] = &[
    "width",
    "height",
    "minWidth",
    "maxWidth",
    "minHeight",
    "maxHeight",
    "top",
    "left",
    "right",
    "bottom",
    "margin",
    "padding",
    "flex",
    "flexGrow",
    "flexShrink",
    "flexBasis",
    "position",
    "display",
];

/// Returns the first layout-affecting key in `props`, if any.
pub(crate) fn layout_prop(props: &Props) -> Option<&str> {
    props
        .keys()
        .map(String::as_str)
        .find(|key| LAYOUT_PROPS.contains(key))
}

/// A mutation of a single native view.
#[derive(Debug)]
pub(crate) enum ViewOp {
    Command { spec: CommandSpec, args: Vec<Value> },
    Accessibility(i32),
    Props(Props),
}

impl ViewOp {
    fn run(&self, view: &mut dyn NativeView) -> Result<(), ViewManagerError> {
        match self {
            ViewOp::Command { spec, args } => view.receive_command(spec, args),
            ViewOp::Accessibility(event_type) => view.send_accessibility_event(*event_type),
            ViewOp::Props(props) => view.update_props(props),
        }
    }
}

pub(crate) struct CommandRouter {
    tags: Arc<TagIndex>,
}

impl CommandRouter {
    pub(crate) fn new(tags: Arc<TagIndex>) -> CommandRouter {
        CommandRouter { tags }
    }

    /// Finds the view manager and the (still active) surface a tag belongs to.
    pub(crate) fn resolve_target(
        &self,
        tag: ReactTag,
        surfaces: &SurfaceRegistry,
    ) -> Result<(TagEntry, Arc<Surface>), BridgeError> {
        let entry = self
            .tags
            .resolve(tag)
            .ok_or(BridgeError::StaleTarget(Target::View(tag)))?;
        let surface = surfaces.active(entry.surface)?;
        Ok((entry, surface))
    }

    /// Looks a command up in the view manager’s table and checks the arguments against it.
    pub(crate) fn resolve_command(
        entry: &TagEntry,
        tag: ReactTag,
        command: &CommandId,
        args: &[Value],
    ) -> Result<CommandSpec, BridgeError> {
        let unsupported = |reason: String| BridgeError::UnsupportedCommand {
            tag,
            command: command.to_string(),
            reason,
        };
        let spec = entry.manager.commands().resolve(command).ok_or_else(|| {
            unsupported(format!("not a command of {}", entry.manager.name()))
        })?;
        spec.validate(args)
            .map_err(|mismatch| unsupported(mismatch.to_string()))?;
        Ok(spec.clone())
    }

    /// Applies an operation on the UI thread.
    ///
    /// The surface and tag are checked again; either may have gone away since the operation was
    /// queued.
    pub(crate) fn apply(
        tree: &mut NativeTree,
        surface: &Surface,
        tag: ReactTag,
        op: ViewOp,
    ) -> Result<(), BridgeError> {
        if !surface.state().accepts_work() {
            return Err(BridgeError::StaleTarget(Target::Surface(surface.id)));
        }
        if tree.surface_of(tag) != Some(surface.id) {
            return Err(BridgeError::StaleTarget(Target::View(tag)));
        }
        tree.with_view(tag, |view| op.run(view))?;
        Ok(())
    }
}
