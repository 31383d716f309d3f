use crate::ids::{ReactTag, SurfaceId};
use crate::value::Props;

/// A native-originated event on its way to the declarative engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub surface: SurfaceId,
    pub tag: ReactTag,
    pub name: String,
    pub payload: Props,
}

impl Event {
    pub fn new(
        surface: SurfaceId,
        tag: ReactTag,
        name: impl Into<String>,
        payload: Props,
    ) -> Event {
        Event {
            surface,
            tag,
            name: name.into(),
            payload,
        }
    }
}
