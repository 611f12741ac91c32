//! Move/Resize Module
//!
//! Interactive pointer-driven move and resize sessions. At most one
//! session runs at a time; every pointer step re-validates that the
//! dragged window still exists, because clients are free to die
//! mid-drag, and an orphaned session is abandoned rather than acted on.

use tracing::{debug, warn};

use crate::display::DisplayServer;
use crate::geometry::Geometry;
use crate::manager::WindowManager;
use crate::{FrameId, Window};

/// Which frame edge or corner the resize drags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    fn moves_left(self) -> bool {
        matches!(self, Self::Left | Self::TopLeft | Self::BottomLeft)
    }

    fn moves_right(self) -> bool {
        matches!(self, Self::Right | Self::TopRight | Self::BottomRight)
    }

    fn moves_top(self) -> bool {
        matches!(self, Self::Top | Self::TopLeft | Self::TopRight)
    }

    fn moves_bottom(self) -> bool {
        matches!(self, Self::Bottom | Self::BottomLeft | Self::BottomRight)
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Move,
    Resize(ResizeEdge),
}

#[derive(Debug)]
pub struct MoveResizeSession {
    pub frame: FrameId,
    window: Window,
    op: Op,
    start_x: i32,
    start_y: i32,
    start_geometry: Geometry,
    last_cells: Option<(u32, u32)>,
}

impl<D: DisplayServer> WindowManager<D> {
    pub fn begin_move(&mut self, frame_id: FrameId, x: i32, y: i32) -> bool {
        self.begin_session(frame_id, x, y, Op::Move)
    }

    pub fn begin_resize(&mut self, frame_id: FrameId, x: i32, y: i32, edge: ResizeEdge) -> bool {
        if self.frames.get(&frame_id).map(|f| f.is_resizable()) != Some(true) {
            return false;
        }
        self.begin_session(frame_id, x, y, Op::Resize(edge))
    }

    fn begin_session(&mut self, frame_id: FrameId, x: i32, y: i32, op: Op) -> bool {
        if self.session.is_some() {
            return false;
        }
        let Some(frame) = self.frames.get(&frame_id) else {
            return false;
        };
        if frame.shaded {
            return false;
        }
        let Some(window) = frame.active else {
            return false;
        };
        let start_geometry = frame.geometry;

        if !self.display.window_exists(window) {
            warn!("0x{:x} vanished before drag start", window);
            return false;
        }
        if let Err(err) = self.display.grab_pointer(window) {
            debug!("pointer grab for 0x{:x} failed: {}", window, err);
            return false;
        }

        self.session = Some(MoveResizeSession {
            frame: frame_id,
            window,
            op,
            start_x: x,
            start_y: y,
            start_geometry,
            last_cells: None,
        });
        true
    }

    /// Feed a pointer position into the running session. Returns false
    /// once no session remains, including the abandoned-window case.
    pub fn motion(&mut self, x: i32, y: i32) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let (frame_id, window, op) = (session.frame, session.window, session.op);

        if !self.display.window_exists(window) {
            warn!("0x{:x} vanished mid-drag, abandoning session", window);
            self.abort_moveresize();
            return false;
        }
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let dx = x - session.start_x;
        let dy = y - session.start_y;
        let start = session.start_geometry;

        let updated = match op {
            Op::Move => {
                let mut geometry = start.with_position(start.x + dx, start.y + dy);
                if self.settings.snap_distance > 0 {
                    if let Ok(screen) = self.display.query_geometry(self.registry.root()) {
                        geometry.x = snap_axis(
                            geometry.x,
                            geometry.width,
                            screen.width,
                            self.settings.snap_distance,
                        );
                        geometry.y = snap_axis(
                            geometry.y,
                            geometry.height,
                            screen.height,
                            self.settings.snap_distance,
                        );
                    }
                }
                geometry
            }
            Op::Resize(edge) => self.resized_geometry(frame_id, start, edge, dx, dy),
        };

        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.geometry = updated;
        }
        self.apply_frame_geometry(frame_id);
        true
    }

    /// Commit the session at its current geometry.
    pub fn finish_moveresize(&mut self) {
        if self.session.take().is_some() {
            if let Err(err) = self.display.ungrab_pointer() {
                debug!("pointer ungrab failed: {}", err);
            }
        }
    }

    /// Drop the session and restore the pre-drag geometry if the frame is
    /// still around.
    pub fn abort_moveresize(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        if let Err(err) = self.display.ungrab_pointer() {
            debug!("pointer ungrab failed: {}", err);
        }
        let frame_id = session.frame;
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.geometry = session.start_geometry;
        }
        if self.frames.contains_key(&frame_id) && self.display.window_exists(session.window) {
            self.apply_frame_geometry(frame_id);
        }
    }

    pub fn moveresize_active(&self) -> bool {
        self.session.is_some()
    }

    fn resized_geometry(
        &mut self,
        frame_id: FrameId,
        start: Geometry,
        edge: ResizeEdge,
        dx: i32,
        dy: i32,
    ) -> Geometry {
        let mut width = start.width as i32;
        let mut height = start.height as i32;
        if edge.moves_right() {
            width += dx;
        } else if edge.moves_left() {
            width -= dx;
        }
        if edge.moves_bottom() {
            height += dy;
        } else if edge.moves_top() {
            height -= dy;
        }
        let width = width.max(1) as u32;
        let height = height.max(1) as u32;

        let active = self.frames.get(&frame_id).and_then(|f| f.active);
        let applied = match active.and_then(|w| self.registry.get(w)) {
            Some(client) => client.size_hints.apply(width, height, false),
            None => crate::hints::AppliedSize {
                width,
                height,
                cell_x: width,
                cell_y: height,
            },
        };

        // Size feedback in hint increments, only when it changes.
        let cells = (applied.cell_x, applied.cell_y);
        if let Some(session) = self.session.as_mut() {
            if session.last_cells != Some(cells) {
                session.last_cells = Some(cells);
                self.presentation
                    .resize_feedback(frame_id, cells.0, cells.1);
            }
        }

        let mut geometry = start.with_size(applied.width, applied.height);
        if edge.moves_left() {
            geometry.x = start.right() - applied.width as i32;
        }
        if edge.moves_top() {
            geometry.y = start.bottom() - applied.height as i32;
        }
        geometry
    }
}

/// Snap a frame edge to the screen edge when it comes within `snap`
/// pixels of it.
fn snap_axis(pos: i32, len: u32, screen_len: u32, snap: u32) -> i32 {
    let snap = snap as i32;
    if pos.abs() <= snap {
        return 0;
    }
    let far = screen_len as i32 - len as i32;
    if (pos - far).abs() <= snap {
        return far;
    }
    pos
}
