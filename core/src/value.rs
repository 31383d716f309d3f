//! Values that cross the thread boundary.

use cgmath::Point2;
use serde::{Deserialize, Serialize};

pub use serde_json::Value;

/// A property or payload map.
pub type Props = serde_json::Map<String, Value>;

const MODE_SHIFT: u32 = 30;
const MODE_MASK: u32 = 0x3 << MODE_SHIFT;

/// How a measure spec constrains its size.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasureMode {
    /// The parent imposes no constraint.
    Unspecified = 0,
    /// The view must be exactly `size`.
    Exactly = 1,
    /// The view may be at most `size`.
    AtMost = 2,
}

/// A width or height constraint for a surface root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub mode: MeasureMode,
    pub size: u32,
}

impl MeasureSpec {
    pub const UNSPECIFIED: MeasureSpec = MeasureSpec {
        mode: MeasureMode::Unspecified,
        size: 0,
    };

    pub fn exactly(size: u32) -> MeasureSpec {
        MeasureSpec {
            mode: MeasureMode::Exactly,
            size: size & !MODE_MASK,
        }
    }

    pub fn at_most(size: u32) -> MeasureSpec {
        MeasureSpec {
            mode: MeasureMode::AtMost,
            size: size & !MODE_MASK,
        }
    }

    /// Decodes a host measure spec: mode in the top two bits, size in the low thirty.
    pub fn from_raw(raw: i32) -> MeasureSpec {
        let raw = raw as u32;
        let mode = match (raw & MODE_MASK) >> MODE_SHIFT {
            1 => MeasureMode::Exactly,
            2 => MeasureMode::AtMost,
            // 3 is not a valid mode on any host
            _ => MeasureMode::Unspecified,
        };
        MeasureSpec {
            mode,
            size: raw & !MODE_MASK,
        }
    }

    /// Encodes this spec in the host’s packed form.
    pub fn to_raw(self) -> i32 {
        (((self.mode as u32) << MODE_SHIFT) | (self.size & !MODE_MASK)) as i32
    }
}

impl Default for MeasureSpec {
    fn default() -> Self {
        MeasureSpec::UNSPECIFIED
    }
}

/// Layout constraints of a surface root, plus its position on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootLayout {
    pub width: MeasureSpec,
    pub height: MeasureSpec,
    pub offset: Point2<i32>,
}

impl RootLayout {
    pub fn new(width: MeasureSpec, height: MeasureSpec) -> RootLayout {
        RootLayout {
            width,
            height,
            offset: Point2::new(0, 0),
        }
    }

    pub fn with_offset(mut self, x: i32, y: i32) -> RootLayout {
        self.offset = Point2::new(x, y);
        self
    }
}

impl Default for RootLayout {
    fn default() -> Self {
        RootLayout::new(MeasureSpec::UNSPECIFIED, MeasureSpec::UNSPECIFIED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_specs_keep_mode_and_size() {
        let at_most = MeasureSpec::at_most(480);
        assert!(at_most.to_raw() < 0, "AT_MOST sets the sign bit");
        assert_eq!(MeasureSpec::from_raw(at_most.to_raw()), at_most);

        let exactly = MeasureSpec::from_raw((1 << 30) | 1080);
        assert_eq!(exactly, MeasureSpec::exactly(1080));
    }

    #[test]
    fn invalid_mode_bits_decode_as_unspecified() {
        let spec = MeasureSpec::from_raw((3u32 << 30) as i32 | 12);
        assert_eq!(spec.mode, MeasureMode::Unspecified);
        assert_eq!(spec.size, 12);
    }

    #[test]
    fn layout_offset() {
        let layout = RootLayout::new(MeasureSpec::exactly(10), MeasureSpec::exactly(20))
            .with_offset(3, 4);
        assert_eq!(layout.offset, Point2::new(3, 4));
        assert_eq!(RootLayout::default().width, MeasureSpec::UNSPECIFIED);
    }
}
