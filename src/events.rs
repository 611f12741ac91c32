//! Events Module
//!
//! Display-server event dispatch. The polling loop outside this crate
//! translates raw protocol events into [`DisplayEvent`] values; dispatch
//! here drives the window lifecycle and any running drag session.

use tracing::{debug, warn};

use crate::client::HintKind;
use crate::client_flags::WmState;
use crate::display::DisplayServer;
use crate::manager::WindowManager;
use crate::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// A window asked to be shown
    MapRequest { window: Window },
    /// A window became viewable
    MapNotify { window: Window },
    /// A window was unmapped; ours or the client withdrawing itself
    UnmapNotify { window: Window },
    DestroyNotify { window: Window },
    PropertyChanged { window: Window, kind: HintKind },
    PointerMotion { x: i32, y: i32 },
    ButtonRelease,
}

impl<D: DisplayServer> WindowManager<D> {
    pub fn handle_event(&mut self, event: DisplayEvent) {
        match event {
            DisplayEvent::MapRequest { window } => {
                if let Some(frame_id) = self.frame_of(window) {
                    // Already managed: a map request on an iconic frame is
                    // a restore request.
                    if self.frame(frame_id).map(|f| f.state) == Some(WmState::Iconic) {
                        self.deiconify(frame_id);
                    } else {
                        self.show_frame(frame_id);
                    }
                } else if let Err(err) = self.manage_window(window) {
                    warn!("cannot manage 0x{:x}: {}", window, err);
                }
            }
            DisplayEvent::MapNotify { window } => {
                let Some(frame_id) = self.frame_of(window) else {
                    return;
                };
                if self.frame(frame_id).map(|f| f.state) == Some(WmState::Withdrawn) {
                    self.show_frame(frame_id);
                }
            }
            DisplayEvent::UnmapNotify { window } => {
                let Some(frame_id) = self.frame_of(window) else {
                    return;
                };
                // Unmaps we caused ourselves (iconify, workspace switch)
                // are not withdrawals.
                let Some(frame) = self.frame(frame_id) else {
                    return;
                };
                if frame.state == WmState::Iconic {
                    return;
                }
                if !frame.stuck && frame.workspace != self.current_workspace {
                    return;
                }
                self.withdraw(window);
            }
            DisplayEvent::DestroyNotify { window } => {
                if self.registry.contains(window) {
                    self.unmanage(window);
                }
            }
            DisplayEvent::PropertyChanged { window, kind } => {
                if let Err(err) = self.update_hints(window, kind) {
                    debug!("hint refresh for 0x{:x} failed: {}", window, err);
                }
            }
            DisplayEvent::PointerMotion { x, y } => {
                self.motion(x, y);
            }
            DisplayEvent::ButtonRelease => {
                self.finish_moveresize();
            }
        }
    }
}
