//! Geometry primitives shared across the window model.

/// Window geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// X coordinate one past the right edge
    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    /// Y coordinate one past the bottom edge
    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn with_size(&self, width: u32, height: u32) -> Self {
        Self { width, height, ..*self }
    }

    pub fn with_position(&self, x: i32, y: i32) -> Self {
        Self { x, y, ..*self }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self { x: 0, y: 0, width: 1, height: 1 }
    }
}
