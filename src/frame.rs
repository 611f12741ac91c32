//! Frame Module
//!
//! The managed window: a decorated container holding one or more client
//! windows as tabs, with an active-client pointer, window state machine,
//! maximize bookkeeping and decoration flags. Operations that only touch
//! one frame live here; attach/detach across frames are coordinated by
//! the window manager.

use bitflags::bitflags;

use crate::client_flags::WmState;
use crate::decorations::{DecorPreset, Decorations, Functions};
use crate::geometry::Geometry;
use crate::{FrameId, Window};

bitflags! {
    /// Maximization state, per axis; both together is a full maximize
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Maximized: u8 {
        const HORZ = 1 << 0;
        const VERT = 1 << 1;
        const FULL = Self::HORZ.bits() | Self::VERT.bits();
    }
}

#[derive(Debug)]
pub struct Frame {
    pub id: FrameId,

    /// Clients in tab order. Never empty for a live frame; the manager
    /// destroys a frame the moment its list drains.
    pub clients: Vec<Window>,
    /// Designated active client; a member of `clients` whenever the list
    /// is non-empty.
    pub active: Option<Window>,

    pub geometry: Geometry,
    /// Pre-maximize geometry, per axis
    saved_geometry: Geometry,
    pub maximized: Maximized,

    pub state: WmState,
    pub shaded: bool,
    /// Omnipresent across workspaces
    pub stuck: bool,
    pub workspace: u32,
    pub layer: i32,

    pub decorations: Decorations,
    pub functions: Functions,
    pub preset: DecorPreset,
    saved_preset: DecorPreset,

    /// Reentrancy guard for recursive stacking/iconify propagation
    pub(crate) op_lock: bool,
}

impl Frame {
    pub fn new(id: FrameId, window: Window, geometry: Geometry, layer: i32) -> Self {
        Self {
            id,
            clients: vec![window],
            active: Some(window),
            geometry,
            saved_geometry: geometry,
            maximized: Maximized::empty(),
            state: WmState::Withdrawn,
            shaded: false,
            stuck: false,
            workspace: 0,
            layer,
            decorations: Decorations::default(),
            functions: Functions::default(),
            preset: DecorPreset::Normal,
            saved_preset: DecorPreset::Normal,
            op_lock: false,
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains(&window)
    }

    pub fn is_iconic(&self) -> bool {
        self.state == WmState::Iconic
    }

    pub fn is_resizable(&self) -> bool {
        self.functions.contains(Functions::RESIZE)
    }

    pub fn is_maximizable(&self) -> bool {
        self.functions.contains(Functions::MAXIMIZE)
    }

    /// Make `window` the active tab. Fails for non-members.
    pub fn set_active(&mut self, window: Window) -> bool {
        if !self.contains(window) {
            return false;
        }
        self.active = Some(window);
        true
    }

    /// Tab to the right of `window`, if any
    pub fn successor_of(&self, window: Window) -> Option<Window> {
        let idx = self.clients.iter().position(|&w| w == window)?;
        self.clients.get(idx + 1).copied()
    }

    /// Tab to the left of `window`, if any
    pub fn predecessor_of(&self, window: Window) -> Option<Window> {
        let idx = self.clients.iter().position(|&w| w == window)?;
        idx.checked_sub(1).map(|i| self.clients[i])
    }

    /// Unconditionally drop a client from the tab list. When it was the
    /// active client the pointer falls forward to the next tab, or back
    /// to the previous one if the removed client was last; an emptied
    /// list leaves no active client.
    pub fn remove_client(&mut self, window: Window) -> bool {
        let Some(idx) = self.clients.iter().position(|&w| w == window) else {
            return false;
        };

        if self.active == Some(window) {
            self.active = if idx + 1 < self.clients.len() {
                Some(self.clients[idx + 1])
            } else if idx > 0 {
                Some(self.clients[idx - 1])
            } else {
                None
            };
        }

        self.clients.remove(idx);
        true
    }

    /// Cycle the active tab forward, wrapping. Returns the new active.
    pub fn next_client(&mut self) -> Option<Window> {
        if self.clients.len() <= 1 {
            return self.active;
        }
        let idx = self
            .active
            .and_then(|a| self.clients.iter().position(|&w| w == a))
            .map(|i| (i + 1) % self.clients.len())
            .unwrap_or(0);
        self.active = Some(self.clients[idx]);
        self.active
    }

    /// Cycle the active tab backward, wrapping. Returns the new active.
    pub fn prev_client(&mut self) -> Option<Window> {
        if self.clients.len() <= 1 {
            return self.active;
        }
        let idx = self
            .active
            .and_then(|a| self.clients.iter().position(|&w| w == a))
            .map(|i| (i + self.clients.len() - 1) % self.clients.len())
            .unwrap_or(0);
        self.active = Some(self.clients[idx]);
        self.active
    }

    /// Toggle full maximize against the given target box, saving or
    /// restoring the pre-maximize geometry.
    pub fn toggle_maximize_full(&mut self, target: Geometry) {
        if self.maximized != Maximized::FULL {
            self.saved_geometry = self.geometry;
            self.geometry = target;
            self.maximized = Maximized::FULL;
        } else {
            self.geometry = self.saved_geometry;
            self.maximized = Maximized::empty();
        }
    }

    pub fn toggle_maximize_horizontal(&mut self, target: Geometry) {
        if !self.maximized.contains(Maximized::HORZ) {
            self.saved_geometry.x = self.geometry.x;
            self.saved_geometry.width = self.geometry.width;
            self.geometry.x = target.x;
            self.geometry.width = target.width;
            self.maximized.insert(Maximized::HORZ);
        } else {
            self.geometry.x = self.saved_geometry.x;
            self.geometry.width = self.saved_geometry.width;
            self.maximized.remove(Maximized::HORZ);
        }
    }

    pub fn toggle_maximize_vertical(&mut self, target: Geometry) {
        if !self.maximized.contains(Maximized::VERT) {
            self.saved_geometry.y = self.geometry.y;
            self.saved_geometry.height = self.geometry.height;
            self.geometry.y = target.y;
            self.geometry.height = target.height;
            self.maximized.insert(Maximized::VERT);
        } else {
            self.geometry.y = self.saved_geometry.y;
            self.geometry.height = self.saved_geometry.height;
            self.maximized.remove(Maximized::VERT);
        }
    }

    /// Toggle shading. Shading needs a titlebar; a shaded frame reports
    /// the iconic protocol state without being iconified. Returns the new
    /// protocol state to publish, or None when shading is not possible.
    pub fn toggle_shade(&mut self) -> Option<WmState> {
        if !self.decorations.contains(Decorations::TITLEBAR) {
            return None;
        }
        self.shaded = !self.shaded;
        Some(if self.shaded { WmState::Iconic } else { WmState::Normal })
    }

    /// Toggle omnipresence. Some observers treat "stuck" as a
    /// pseudo-workspace, so the caller re-notifies workspace state.
    pub fn toggle_stick(&mut self) {
        self.stuck = !self.stuck;
    }

    pub fn apply_preset(&mut self, preset: DecorPreset) {
        self.preset = preset;
        self.decorations = preset.decorations();
        self.functions = preset.functions();
    }

    /// Drop decorations entirely or restore the remembered preset.
    pub fn toggle_decorations(&mut self) {
        if self.shaded {
            return;
        }
        if self.decorations.contains(Decorations::ENABLED) {
            self.saved_preset = self.preset;
            self.apply_preset(DecorPreset::None);
            self.decorations.remove(Decorations::ENABLED);
        } else {
            let preset = if self.saved_preset == DecorPreset::None {
                DecorPreset::Normal
            } else {
                self.saved_preset
            };
            self.apply_preset(preset);
        }
    }

    pub fn decoration_mask(&self) -> Decorations {
        self.decorations
    }

    pub fn set_decoration_mask(&mut self, mask: Decorations) {
        self.decorations = mask;
    }

    /// A client with pinned min == max hints cannot be resized; drop the
    /// resize and maximize affordances. Judged once at attach time.
    pub fn restrict_to_fixed_size(&mut self) {
        self.functions.remove(Functions::RESIZE | Functions::MAXIMIZE);
        self.decorations.remove(Decorations::MAXIMIZE | Decorations::HANDLE);
    }
}
