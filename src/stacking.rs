//! Stacking Module
//!
//! Global frame stacking order partitioned into layers. Raise and lower
//! stay inside a frame's layer band; transient chains move as a unit, the
//! root of the chain first and its dialogs kept above it.

use tracing::debug;

use crate::display::DisplayServer;
use crate::manager::WindowManager;
use crate::transients;
use crate::{FrameId, Window};

/// Layers grow upward; frames in a higher layer always stack above lower
/// ones. Intermediate odd values are valid, the presets just skip them.
pub mod layer {
    pub const DESKTOP: i32 = 0;
    pub const BELOW: i32 = 2;
    pub const NORMAL: i32 = 4;
    pub const ABOVE: i32 = 6;
    pub const FULLSCREEN: i32 = 8;
    pub const MENU: i32 = 10;
}

/// Bottom-to-top frame order, each entry carrying its layer so band
/// boundaries can be found without consulting the frame table.
#[derive(Debug, Default)]
pub struct StackingManager {
    order: Vec<(FrameId, i32)>,
}

impl StackingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames bottom-to-top.
    pub fn order(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.order.iter().map(|&(id, _)| id)
    }

    pub fn remove(&mut self, frame: FrameId) {
        self.order.retain(|&(id, _)| id != frame);
    }

    /// Place (or move) a frame at the top of its layer band.
    pub fn raise(&mut self, frame: FrameId, layer: i32) {
        self.remove(frame);
        let at = self
            .order
            .iter()
            .position(|&(_, l)| l > layer)
            .unwrap_or(self.order.len());
        self.order.insert(at, (frame, layer));
    }

    /// Place (or move) a frame at the bottom of its layer band.
    pub fn lower(&mut self, frame: FrameId, layer: i32) {
        self.remove(frame);
        let at = self
            .order
            .iter()
            .position(|&(_, l)| l >= layer)
            .unwrap_or(self.order.len());
        self.order.insert(at, (frame, layer));
    }

    /// Place a frame directly above `anchor`, clamped into its own band.
    pub fn place_above(&mut self, frame: FrameId, layer: i32, anchor: FrameId) {
        self.remove(frame);
        let Some(anchor_at) = self.order.iter().position(|&(id, _)| id == anchor) else {
            return self.raise(frame, layer);
        };
        let mut at = anchor_at + 1;
        while at < self.order.len() && self.order[at].1 < layer {
            at += 1;
        }
        if self.order.get(at.wrapping_sub(1)).map(|&(_, l)| l > layer) == Some(true) {
            return self.lower(frame, layer);
        }
        self.order.insert(at, (frame, layer));
    }

    pub fn layer_of(&self, frame: FrameId) -> Option<i32> {
        self.order
            .iter()
            .find(|&&(id, _)| id == frame)
            .map(|&(_, l)| l)
    }
}

impl<D: DisplayServer> WindowManager<D> {
    /// Raise a frame to the top of its layer. The whole transient chain
    /// moves: the root of the chain rises first and every visible
    /// transient ends up stacked above it.
    pub fn raise(&mut self, frame_id: FrameId) {
        if self.frames.get(&frame_id).map(|f| f.op_lock) != Some(false) {
            return;
        }
        if self.frames.get(&frame_id).map(|f| f.is_iconic()) == Some(true) {
            self.deiconify(frame_id);
        }
        let root = self.chain_root(frame_id);
        self.raise_tree(root);
        self.sync_stacking();
    }

    /// Lower a frame to the bottom of its layer, transients staying above
    /// their parent.
    pub fn lower(&mut self, frame_id: FrameId) {
        if self.frames.get(&frame_id).map(|f| f.op_lock) != Some(false) {
            return;
        }
        let root = self.chain_root(frame_id);
        self.lower_tree(root, None);
        self.sync_stacking();
    }

    /// Move a frame (and its transient chain) to another layer, then raise
    /// it within the new band.
    pub fn move_to_layer(&mut self, frame_id: FrameId, layer: i32) {
        let layer = layer.clamp(layer::DESKTOP, layer::MENU);
        let root = self.chain_root(frame_id);
        self.assign_layer_tree(root, layer);
        self.raise_tree(root);
        self.sync_stacking();
    }

    pub fn raise_layer(&mut self, frame_id: FrameId) {
        if let Some(current) = self.frames.get(&frame_id).map(|f| f.layer) {
            self.move_to_layer(frame_id, current + 2);
        }
    }

    pub fn lower_layer(&mut self, frame_id: FrameId) {
        if let Some(current) = self.frames.get(&frame_id).map(|f| f.layer) {
            self.move_to_layer(frame_id, current - 2);
        }
    }

    /// Frame owning the root of the transient chain the given frame's
    /// active client belongs to; the frame itself when untransient.
    fn chain_root(&self, frame_id: FrameId) -> FrameId {
        self.frames
            .get(&frame_id)
            .and_then(|f| f.active)
            .map(|w| transients::root_transient_for(&self.registry, w))
            .and_then(|w| self.registry.get(w).and_then(|c| c.frame))
            .unwrap_or(frame_id)
    }

    fn raise_tree(&mut self, frame_id: FrameId) {
        let (layer, clients) = match self.frames.get_mut(&frame_id) {
            Some(frame) if !frame.op_lock => {
                frame.op_lock = true;
                (frame.layer, frame.clients.clone())
            }
            _ => return,
        };

        self.stacking.raise(frame_id, layer);
        for child_frame in self.transient_child_frames(frame_id, &clients) {
            self.raise_tree(child_frame);
        }

        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.op_lock = false;
        }
    }

    fn lower_tree(&mut self, frame_id: FrameId, anchor: Option<FrameId>) {
        let (layer, clients) = match self.frames.get_mut(&frame_id) {
            Some(frame) if !frame.op_lock => {
                frame.op_lock = true;
                (frame.layer, frame.clients.clone())
            }
            _ => return,
        };

        match anchor {
            None => self.stacking.lower(frame_id, layer),
            Some(anchor) => self.stacking.place_above(frame_id, layer, anchor),
        }
        for child_frame in self.transient_child_frames(frame_id, &clients) {
            self.lower_tree(child_frame, Some(frame_id));
        }

        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.op_lock = false;
        }
    }

    /// Propagate a layer change down a transient chain. The whole chain
    /// lands in the root's layer.
    fn assign_layer_tree(&mut self, frame_id: FrameId, new_layer: i32) {
        let (changed, clients) = match self.frames.get_mut(&frame_id) {
            Some(frame) if !frame.op_lock => {
                frame.op_lock = true;
                let changed = frame.layer != new_layer;
                frame.layer = new_layer;
                (changed, frame.clients.clone())
            }
            _ => return,
        };

        if changed {
            self.presentation.layer_changed(frame_id, new_layer);
        }
        for child_frame in self.transient_child_frames(frame_id, &clients) {
            self.assign_layer_tree(child_frame, new_layer);
        }

        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.op_lock = false;
        }
    }

    /// Frames holding visible transients of any client in `clients`.
    fn transient_child_frames(&self, frame_id: FrameId, clients: &[Window]) -> Vec<FrameId> {
        let mut result = Vec::new();
        for &window in clients {
            let Some(client) = self.registry.get(window) else {
                continue;
            };
            for &child in &client.transients {
                let Some(child_frame) = self.registry.get(child).and_then(|c| c.frame) else {
                    continue;
                };
                if child_frame == frame_id || result.contains(&child_frame) {
                    continue;
                }
                if self.frames.get(&child_frame).map(|f| f.is_iconic()) == Some(false) {
                    result.push(child_frame);
                }
            }
        }
        result
    }

    /// Replay the logical order into the display server's stack.
    pub(crate) fn sync_stacking(&mut self) {
        let order: Vec<FrameId> = self.stacking.order().collect();
        let mut below: Option<Window> = None;
        for frame_id in order {
            let Some(window) = self.frames.get(&frame_id).and_then(|f| f.active) else {
                continue;
            };
            let result = match below {
                None => self.display.lower_in_stack(window),
                Some(sibling) => self.display.restack_above(window, sibling),
            };
            if let Err(err) = result {
                debug!("restack of 0x{:x} failed: {}", window, err);
            }
            below = Some(window);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raise_stays_inside_layer_band() {
        let mut stack = StackingManager::new();
        stack.raise(1, layer::NORMAL);
        stack.raise(2, layer::NORMAL);
        stack.raise(3, layer::ABOVE);
        // Frame 1 tops its own band but never crosses into ABOVE.
        stack.raise(1, layer::NORMAL);
        let order: Vec<_> = stack.order().collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn lower_goes_to_bottom_of_band_only() {
        let mut stack = StackingManager::new();
        stack.raise(1, layer::DESKTOP);
        stack.raise(2, layer::NORMAL);
        stack.raise(3, layer::NORMAL);
        stack.lower(3, layer::NORMAL);
        let order: Vec<_> = stack.order().collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn place_above_tracks_anchor() {
        let mut stack = StackingManager::new();
        stack.raise(1, layer::NORMAL);
        stack.raise(2, layer::NORMAL);
        stack.raise(3, layer::NORMAL);
        stack.lower(1, layer::NORMAL);
        stack.place_above(3, layer::NORMAL, 1);
        let order: Vec<_> = stack.order().collect();
        assert_eq!(order, vec![1, 3, 2]);
    }

    #[test]
    fn layer_change_reorders_globally() {
        let mut stack = StackingManager::new();
        stack.raise(1, layer::NORMAL);
        stack.raise(2, layer::ABOVE);
        stack.raise(1, layer::FULLSCREEN);
        let order: Vec<_> = stack.order().collect();
        assert_eq!(order, vec![2, 1]);
        assert_eq!(stack.layer_of(1), Some(layer::FULLSCREEN));
    }
}
