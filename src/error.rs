//! Error taxonomy for the window model.
//!
//! Every variant here is handled locally: an operation that hits one of
//! these logs it and silently does not take effect. Nothing in this crate
//! treats them as fatal.

use crate::Window;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Operation referenced a window handle nobody has registered.
    #[error("unknown window handle 0x{0:x}")]
    LookupFailure(Window),

    /// The display server could not answer, or the window vanished
    /// mid-operation.
    #[error("display query failed for window 0x{window:x}: {reason}")]
    ProtocolQueryFailure { window: Window, reason: String },

    /// Requested geometry violates the client's size hints. The geometry
    /// is clamped, never rejected outright.
    #[error("geometry {width}x{height} violates size hints of window 0x{window:x}")]
    ConstraintViolation { window: Window, width: u32, height: u32 },

    /// A transient chain looped back on itself. Repaired by clearing one
    /// edge; never surfaced to callers.
    #[error("transient cycle detected at window 0x{0:x}")]
    CycleDetected(Window),

    /// Acting on a client or frame that is mid-teardown.
    #[error("stale reference to window 0x{0:x}")]
    StaleReference(Window),
}

pub type Result<T> = std::result::Result<T, Error>;
