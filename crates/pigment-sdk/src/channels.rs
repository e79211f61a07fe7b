//! Channel selection sets passed to pixel operations.

use std::ops::{BitOr, BitOrAssign};

/// Set of color channels an operation applies to.
///
/// Stored as a 64-bit mask; generated bindings narrow it to the platform's
/// raw encoding at the call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Channels(u64);

impl Channels {
    /// No channels.
    pub const NONE: Channels = Channels(0);
    /// Red channel.
    pub const RED: Channels = Channels(1 << 0);
    /// Green channel.
    pub const GREEN: Channels = Channels(1 << 1);
    /// Blue channel.
    pub const BLUE: Channels = Channels(1 << 2);
    /// Alpha channel.
    pub const ALPHA: Channels = Channels(1 << 3);
    /// Black channel of CMYK images.
    pub const BLACK: Channels = Channels(1 << 4);
    /// All color channels without alpha.
    pub const RGB: Channels = Channels(Self::RED.0 | Self::GREEN.0 | Self::BLUE.0);
    /// Every channel.
    pub const ALL: Channels = Channels(u64::MAX);

    /// Raw mask for the native side.
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reinterprets a raw mask reported by the native side.
    pub fn from_raw(raw: u64) -> Self {
        Channels(raw)
    }

    /// Whether every channel in `other` is selected.
    pub fn contains(self, other: Channels) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Channels {
    type Output = Channels;

    fn bitor(self, rhs: Channels) -> Channels {
        Channels(self.0 | rhs.0)
    }
}

impl BitOrAssign for Channels {
    fn bitor_assign(&mut self, rhs: Channels) {
        self.0 |= rhs.0;
    }
}
