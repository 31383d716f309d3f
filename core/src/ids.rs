use core::fmt;
use serde::{Deserialize, Serialize};

/// A unique identifier for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub i32);

impl SurfaceId {
    /// The surface addressed by legacy calls that don’t name one.
    ///
    /// It has no lifecycle and is never torn down.
    pub const IMPLICIT: SurfaceId = SurfaceId(-1);
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifies a node in a mounted view tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReactTag(pub i32);

impl fmt::Display for ReactTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
