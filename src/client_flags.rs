//! Client Flags
//!
//! Bitfield flags and small enums describing per-client protocol state.

use bitflags::bitflags;

bitflags! {
    /// WM protocol flags a client has announced support for
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WmProtocols: u32 {
        /// Accepts a WM_DELETE_WINDOW close request
        const DELETE     = 1 << 0;
        /// Listens for WM_TAKE_FOCUS messages
        const TAKE_FOCUS = 1 << 1;
    }
}

/// Window type (EWMH _NET_WM_WINDOW_TYPE)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
    Dialog,
    Toolbar,
    Menu,
    Utility,
    Splash,
    Notification,
}

/// ICCCM window state, with the protocol's WM_STATE numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WmState {
    /// Not mapped, not iconified; the window is not shown at all
    #[default]
    Withdrawn = 0,
    /// Mapped and visible
    Normal = 1,
    /// Iconified (hidden but reachable)
    Iconic = 3,
}
