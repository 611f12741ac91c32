//! Presentation Module
//!
//! Observer seam between the window model and whatever draws it. The
//! model never renders; it announces state transitions and a presentation
//! layer (frame decorations, pagers, taskbars) reacts. Every hook has a
//! no-op default so observers implement only what they draw.

use crate::client_flags::WmState;
use crate::{FrameId, Window};

pub trait Presentation {
    fn title_changed(&mut self, _frame: FrameId, _window: Window, _title: &str) {}
    fn state_changed(&mut self, _frame: FrameId, _state: WmState) {}
    fn shade_changed(&mut self, _frame: FrameId, _shaded: bool) {}
    fn workspace_changed(&mut self, _frame: FrameId, _workspace: u32, _stuck: bool) {}
    fn layer_changed(&mut self, _frame: FrameId, _layer: i32) {}

    /// Interactive resize progress, in size-hint increments (rows and
    /// columns for a terminal).
    fn resize_feedback(&mut self, _frame: FrameId, _cols: u32, _rows: u32) {}

    fn tab_added(&mut self, _frame: FrameId, _window: Window) {}
    fn tab_removed(&mut self, _frame: FrameId, _window: Window) {}
    fn active_tab_changed(&mut self, _frame: FrameId, _window: Option<Window>) {}

    fn frame_created(&mut self, _frame: FrameId) {}
    fn frame_destroyed(&mut self, _frame: FrameId) {}
    fn client_destroyed(&mut self, _window: Window) {}
}

/// Headless presentation, used before a renderer registers and in tests.
#[derive(Debug, Default)]
pub struct NoopPresentation;

impl Presentation for NoopPresentation {}
