//! Display Module
//!
//! The boundary to the display server. Everything the window model needs
//! from the windowing protocol goes through the [`DisplayServer`] trait;
//! connection setup and the event polling loop live outside this crate.
//! The x11rb-backed implementation is in [`crate::x11`].

use crate::client_flags::{WindowType, WmProtocols, WmState};
use crate::error::Result;
use crate::geometry::Geometry;
use crate::hints::RawSizeHints;
use crate::Window;

/// Protocol message kinds the model can ask the display server to deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolKind {
    /// WM_DELETE_WINDOW close request
    Delete,
    /// WM_TAKE_FOCUS focus offer
    TakeFocus,
}

/// Raw WM_HINTS property, every field optional
#[derive(Debug, Clone, Copy, Default)]
pub struct RawWmHints {
    pub input: Option<bool>,
    pub initial_state: Option<WmState>,
    pub urgent: bool,
}

/// Snapshot of everything a window has announced about itself
#[derive(Debug, Clone, Default)]
pub struct WindowHints {
    pub title: String,
    pub instance_name: String,
    pub class_name: String,
    pub normal: Option<RawSizeHints>,
    pub wm: Option<RawWmHints>,
    pub protocols: WmProtocols,
    pub window_type: WindowType,
    pub modal: bool,
    /// Handle named by WM_TRANSIENT_FOR, unresolved
    pub transient_for: Option<Window>,
}

/// Synchronous display-server collaborator.
///
/// Every call completes before it returns; failures mean the operation
/// should be abandoned, never retried.
pub trait DisplayServer {
    fn root(&self) -> Window;

    fn query_geometry(&self, window: Window) -> Result<Geometry>;
    fn query_hints(&self, window: Window) -> Result<WindowHints>;

    /// Opaque property blob round-trips; the model never interprets them.
    fn get_property(&self, window: Window, key: &str) -> Result<Option<Vec<u8>>>;
    fn set_property(&self, window: Window, key: &str, data: &[u8]) -> Result<()>;

    fn send_protocol_message(&self, window: Window, kind: ProtocolKind) -> Result<()>;
    fn set_input_focus(&self, window: Window) -> Result<()>;

    fn grab_pointer(&self, window: Window) -> Result<()>;
    fn ungrab_pointer(&self) -> Result<()>;

    fn map_window(&self, window: Window) -> Result<()>;
    fn unmap_window(&self, window: Window) -> Result<()>;
    fn reparent(&self, window: Window, new_parent: Window, x: i32, y: i32) -> Result<()>;
    fn configure(&self, window: Window, geometry: Geometry) -> Result<()>;

    fn raise_in_stack(&self, window: Window) -> Result<()>;
    fn lower_in_stack(&self, window: Window) -> Result<()>;
    /// Stack `window` directly above `sibling`
    fn restack_above(&self, window: Window, sibling: Window) -> Result<()>;

    fn change_border_width(&self, window: Window, px: u32) -> Result<()>;
    fn kill_client(&self, window: Window) -> Result<()>;

    /// Re-validation primitive: does the window still exist right now?
    /// Checked immediately before any stateful operation whose target may
    /// have vanished mid-session.
    fn window_exists(&self, window: Window) -> bool;
}
