//! Hints Module
//!
//! Size-hint normalization and the geometry constraint solver: clamping,
//! aspect-ratio correction and increment quantization of proposed window
//! sizes (ICCCM section 4.1.2.3).

/// One side of an aspect-ratio bound, as the (x, y) pair the client
/// declared. A non-positive `y` means the bound is unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Aspect {
    pub x: u32,
    pub y: u32,
}

impl Aspect {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Raw size-hint property as read from the window, every field optional
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSizeHints {
    pub min_size: Option<(u32, u32)>,
    pub max_size: Option<(u32, u32)>,
    pub size_inc: Option<(u32, u32)>,
    pub base_size: Option<(u32, u32)>,
    pub aspect: Option<(Aspect, Aspect)>,
    pub win_gravity: Option<u8>,
}

/// Normalized size hints. `max_*` of 0 means unbounded; increments are
/// never 0 after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeHints {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub width_inc: u32,
    pub height_inc: u32,
    pub base_width: u32,
    pub base_height: u32,
    pub min_aspect: Aspect,
    pub max_aspect: Aspect,
    pub win_gravity: u8,
}

/// NorthWest in core-protocol gravity numbering
const NORTH_WEST_GRAVITY: u8 = 1;

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            min_width: 1,
            min_height: 1,
            max_width: 0,
            max_height: 0,
            width_inc: 1,
            height_inc: 1,
            base_width: 1,
            base_height: 1,
            min_aspect: Aspect::default(),
            max_aspect: Aspect::default(),
            win_gravity: NORTH_WEST_GRAVITY,
        }
    }
}

/// Result of clamping a proposed size against a hint set. `cell_x`/`cell_y`
/// are the increment counts shown to the user as "N x M" feedback during
/// interactive resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedSize {
    pub width: u32,
    pub height: u32,
    pub cell_x: u32,
    pub cell_y: u32,
}

impl SizeHints {
    /// Normalize a raw hint property. Absent min/base fields borrow from
    /// each other; absent max means unbounded; increments default to 1.
    pub fn from_raw(raw: Option<&RawSizeHints>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let mut hints = Self::default();

        match (raw.min_size, raw.base_size) {
            (Some((mw, mh)), Some((bw, bh))) => {
                hints.min_width = mw;
                hints.min_height = mh;
                hints.base_width = bw;
                hints.base_height = bh;
            }
            (Some((mw, mh)), None) => {
                hints.min_width = mw;
                hints.min_height = mh;
                hints.base_width = mw;
                hints.base_height = mh;
            }
            (None, Some((bw, bh))) => {
                hints.base_width = bw;
                hints.base_height = bh;
                hints.min_width = bw;
                hints.min_height = bh;
            }
            (None, None) => {
                hints.min_width = 1;
                hints.min_height = 1;
                hints.base_width = 0;
                hints.base_height = 0;
            }
        }

        if let Some((mw, mh)) = raw.max_size {
            hints.max_width = mw;
            hints.max_height = mh;
        } else {
            hints.max_width = 0;
            hints.max_height = 0;
        }

        if let Some((wi, hi)) = raw.size_inc {
            hints.width_inc = wi.max(1);
            hints.height_inc = hi.max(1);
        }

        if let Some((min, max)) = raw.aspect {
            hints.min_aspect = min;
            hints.max_aspect = max;
        }

        if let Some(gravity) = raw.win_gravity {
            hints.win_gravity = gravity;
        }

        hints
    }

    /// A window whose hints pin min == max cannot be resized by the user.
    pub fn is_fixed_size(&self) -> bool {
        self.max_width > 0
            && self.max_height > 0
            && self.min_width == self.max_width
            && self.min_height == self.max_height
    }

    /// Clamp a proposed size to the nearest conforming one.
    ///
    /// Aspect correction runs before quantization (satisfying both exactly
    /// is not generally possible, and clients do not combine them in
    /// practice). For interactive resize the (width, height) point is
    /// projected onto the nearest point of the ratio line through the
    /// origin; when maximizing we must never grow past the proposed box,
    /// so one dimension is held and the other derived from the ratio.
    pub fn apply(&self, width: u32, height: u32, maximizing: bool) -> AppliedSize {
        let mut width = width.max(self.min_width);
        let mut height = height.max(self.min_height);

        if self.max_width > 0 {
            width = width.min(self.max_width);
        }
        if self.max_height > 0 {
            height = height.min(self.max_height);
        }

        // Aspect bounds apply to the size in excess of the base size:
        //   min_aspect.x     width - base_width      max_aspect.x
        //   ------------  <  ------------------  <  ------------
        //   min_aspect.y     height - base_height    max_aspect.y
        if self.min_aspect.y > 0 && self.max_aspect.y > 0 && height > self.base_height {
            let mut widthd = width.saturating_sub(self.base_width) as f64;
            let mut heightd = (height - self.base_height) as f64;

            let min = self.min_aspect.x as f64 / self.min_aspect.y as f64;
            let max = self.max_aspect.x as f64 / self.max_aspect.y as f64;
            let actual = widthd / heightd;

            if min > 0.0 && max > 0.0 && actual > 0.0 {
                let mut changed = false;
                if actual < min {
                    changed = true;
                    if maximizing {
                        heightd = widthd / min;
                    } else {
                        (widthd, heightd) = closest_point_to_line(widthd, heightd, min);
                    }
                } else if actual > max {
                    changed = true;
                    if maximizing {
                        widthd = heightd * max;
                    } else {
                        (widthd, heightd) = closest_point_to_line(widthd, heightd, max);
                    }
                }

                if changed {
                    width = widthd as u32 + self.base_width;
                    height = heightd as u32 + self.base_height;
                }
            }
        }

        // Quantize to the base + increment grid, rounding down.
        let width_inc = self.width_inc.max(1);
        let height_inc = self.height_inc.max(1);
        let cell_x = width.saturating_sub(self.base_width) / width_inc;
        let cell_y = height.saturating_sub(self.base_height) / height_inc;

        AppliedSize {
            width: cell_x * width_inc + self.base_width,
            height: cell_y * height_inc + self.base_height,
            cell_x,
            cell_y,
        }
    }

    /// True iff the size already satisfies every hint: within min/max,
    /// exactly on the base + increment grid, and inside the aspect bounds.
    pub fn check(&self, width: u32, height: u32) -> bool {
        if width < self.min_width || height < self.min_height {
            return false;
        }
        if self.max_width > 0 && width > self.max_width {
            return false;
        }
        if self.max_height > 0 && height > self.max_height {
            return false;
        }

        let (Some(dw), Some(dh)) = (
            width.checked_sub(self.base_width),
            height.checked_sub(self.base_height),
        ) else {
            return false;
        };
        if dw % self.width_inc.max(1) != 0 || dh % self.height_inc.max(1) != 0 {
            return false;
        }

        if height > 0 {
            let ratio = width as f64 / height as f64;
            if self.min_aspect.y > 0
                && (self.min_aspect.x as f64 / self.min_aspect.y as f64) > ratio
            {
                return false;
            }
            if self.max_aspect.y > 0
                && (self.max_aspect.x as f64 / self.max_aspect.y as f64) < ratio
            {
                return false;
            }
        }

        true
    }
}

/// Closest point to a line through the origin with the given gradient.
/// A gradient from the origin goes through (gradient, 1), so the
/// projection of (px, py) is u * (gradient, 1) with
/// u = (px * gradient + py) / (gradient^2 + 1).
fn closest_point_to_line(px: f64, py: f64, gradient: f64) -> (f64, f64) {
    let u = (px * gradient + py) / (gradient * gradient + 1.0);
    (u * gradient, u)
}
