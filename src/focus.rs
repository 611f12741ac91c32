//! Focus Module
//!
//! Input focus bookkeeping: who holds focus, the most-recently-used
//! history used for focus reverts, and the modal redirect that keeps a
//! blocked parent from stealing focus back from its modal dialog.

use std::collections::VecDeque;

use tracing::debug;

use crate::display::DisplayServer;
use crate::manager::WindowManager;
use crate::{FrameId, Window};

/// Focus reverts rarely need to look back further than this.
const MAX_HISTORY: usize = 32;

/// Most-recently-used focus record
#[derive(Debug, Default)]
pub struct FocusManager {
    focused: Option<Window>,
    history: VecDeque<Window>,
}

impl FocusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<Window> {
        self.focused
    }

    /// Record a successful focus change. The previous holder moves to the
    /// front of the revert history.
    pub fn note_focused(&mut self, window: Window) {
        if self.focused == Some(window) {
            return;
        }
        if let Some(prev) = self.focused.replace(window) {
            self.history.retain(|&w| w != prev);
            self.history.push_front(prev);
            self.history.truncate(MAX_HISTORY);
        }
        self.history.retain(|&w| w != window);
    }

    /// Scrub a destroyed or unmanaged window from all focus records.
    pub fn forget(&mut self, window: Window) {
        self.history.retain(|&w| w != window);
        if self.focused == Some(window) {
            self.focused = None;
        }
    }

    /// Most recent revert candidate, consumed.
    pub fn pop_recent(&mut self) -> Option<Window> {
        self.history.pop_front()
    }

    pub(crate) fn clear_focused(&mut self) {
        self.focused = None;
    }
}

impl<D: DisplayServer> WindowManager<D> {
    /// Focus a frame by focusing its active client, subject to the modal
    /// redirect.
    pub fn focus_frame(&mut self, frame_id: FrameId) -> bool {
        let Some(active) = self.frames.get(&frame_id).and_then(|f| f.active) else {
            return false;
        };
        self.focus_client(active)
    }

    /// Focus a client. A client holding modal descendants is blocked; the
    /// attempt is redirected to its innermost modal transient, which may
    /// live in a different frame.
    pub fn focus_client(&mut self, window: Window) -> bool {
        let Some(modal_count) = self.registry.get(window).map(|c| c.modal_count) else {
            return false;
        };

        let target = if modal_count > 0 {
            let redirected = self.innermost_modal(window).unwrap_or(window);
            if redirected != window {
                debug!(
                    "focus on 0x{:x} redirected to modal transient 0x{:x}",
                    window, redirected
                );
            }
            redirected
        } else {
            window
        };

        let (accepts, target_frame) = match self.registry.get(target) {
            Some(client) => (client.accepts_focus(), client.frame),
            None => return false,
        };
        if !accepts || !self.display.window_exists(target) {
            return false;
        }

        if let Some(frame_id) = target_frame {
            if self.frames.get(&frame_id).map(|f| f.is_iconic()) == Some(true) {
                self.deiconify(frame_id);
            }
            if let Some(frame) = self.frames.get_mut(&frame_id) {
                frame.set_active(target);
            }
        }

        let Some(client) = self.registry.get(target) else {
            return false;
        };
        if client.send_focus(&self.display) {
            self.focus.note_focused(target);
            true
        } else {
            false
        }
    }

    /// Revert focus to the most recent still-living candidate after the
    /// focus holder went away.
    pub fn revert_focus(&mut self) -> Option<Window> {
        while let Some(window) = self.focus.pop_recent() {
            let Some(client) = self.registry.get(window) else {
                continue;
            };
            if !client.accepts_focus() || !self.display.window_exists(window) {
                continue;
            }
            // Never revert onto something that is not on screen.
            let iconic = client
                .frame
                .and_then(|f| self.frames.get(&f))
                .map(|f| f.is_iconic())
                .unwrap_or(false);
            if iconic {
                continue;
            }
            if client.send_focus(&self.display) {
                self.focus.note_focused(window);
                return Some(window);
            }
        }
        self.focus.clear_focused();
        None
    }

    /// Deepest modal transient blocking `window`, following modal counts
    /// down the forest. Never the window itself.
    fn innermost_modal(&self, window: Window) -> Option<Window> {
        let mut current = window;
        let mut found = None;
        // modal_count > 0 guarantees a modal descendant exists, but the
        // forest invariant is re-checked by bounding the descent.
        for _ in 0..self.registry.len() {
            let client = self.registry.get(current)?;
            let next = client.transients.iter().copied().find(|&child| {
                self.registry
                    .get(child)
                    .map(|c| c.modal || c.modal_count > 0)
                    .unwrap_or(false)
            });
            let Some(next) = next else { break };
            let Some(child) = self.registry.get(next) else { break };
            if child.modal {
                found = Some(next);
            }
            if child.modal_count == 0 {
                break;
            }
            current = next;
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_orders_by_recency() {
        let mut focus = FocusManager::new();
        focus.note_focused(0xa);
        focus.note_focused(0xb);
        focus.note_focused(0xc);
        assert_eq!(focus.focused(), Some(0xc));
        assert_eq!(focus.pop_recent(), Some(0xb));
        assert_eq!(focus.pop_recent(), Some(0xa));
        assert_eq!(focus.pop_recent(), None);
    }

    #[test]
    fn refocusing_moves_entry_instead_of_duplicating() {
        let mut focus = FocusManager::new();
        focus.note_focused(0xa);
        focus.note_focused(0xb);
        focus.note_focused(0xa);
        focus.note_focused(0xc);
        assert_eq!(focus.pop_recent(), Some(0xa));
        assert_eq!(focus.pop_recent(), Some(0xb));
        assert_eq!(focus.pop_recent(), None);
    }

    #[test]
    fn forget_scrubs_focused_and_history() {
        let mut focus = FocusManager::new();
        focus.note_focused(0xa);
        focus.note_focused(0xb);
        focus.forget(0xb);
        assert_eq!(focus.focused(), None);
        focus.forget(0xa);
        assert_eq!(focus.pop_recent(), None);
    }
}
