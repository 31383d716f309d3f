//! Shared data model for the surface bridge.
//!
//! # Conceptual overview
//! The surface bridge sits between a declarative engine, which decides what a view tree should
//! look like, and a native view hierarchy that may only be touched from one UI thread. This crate
//! contains the parts both sides agree on; the coordination itself lives in `surface-bridge`.
//!
//! ## Surfaces and tags
//! A surface is an independently mounted UI root, identified by a [`SurfaceId`]. Inside a
//! surface, every native view is addressed by a [`ReactTag`]. Tags are lookup keys into the
//! currently mounted tree: a tag that refers to a removed view is *stale*, and every operation on
//! a stale tag is a defined failure rather than undefined behavior.
//!
//! ## View managers
//! Each native widget type has a [`ViewManager`]. It constructs [`NativeView`]s, and it exports a
//! [`CommandTable`] that describes the imperative commands its views understand, along with the
//! argument kinds each one expects. View managers are registered in a [`ViewManagerRegistry`],
//! which readers access through cheap copy-on-write snapshots.
//!
//! ## Mounting
//! The engine describes tree changes as [`MountItem`]s. They are applied to the [`NativeTree`],
//! which owns the native views and keeps a concurrently readable [`TagIndex`] in sync so that
//! commands can be resolved from any thread.
//!
//! ## Collaborators
//! The declarative engine is abstracted as [`Engine`]; events flowing back to it go through an
//! [`EventSink`]. Host root views are passed around as opaque [`RootHandle`]s.

pub mod backend;
mod command;
mod event;
mod ids;
mod mount;
mod registry;
mod tree;
mod value;

pub use backend::{
    Engine, EventSink, NativeView, RootHandle, SurfaceStart, ViewManager, ViewManagerError,
};
pub use command::{ArgKind, ArgumentMismatch, CommandId, CommandSpec, CommandTable};
pub use event::Event;
pub use ids::{ReactTag, SurfaceId};
pub use mount::MountItem;
pub use registry::{Catalog, ViewManagerRegistry};
pub use tree::{NativeTree, PatchError, TagEntry, TagIndex};
pub use value::{MeasureMode, MeasureSpec, Props, RootLayout, Value};
