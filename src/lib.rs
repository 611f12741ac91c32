//! tabwm - tabbed window management core
//!
//! The client/window object model of a tabbing X11 window manager:
//! client identity and hints, tab-group frames, the transient-window
//! forest, focus, layered stacking and interactive move/resize. Display
//! access goes through the [`display::DisplayServer`] trait; the
//! x11rb-backed implementation lives in [`x11`] and rendering hangs off
//! the [`presentation::Presentation`] observer.

pub mod client;
pub mod client_flags;
pub mod decorations;
pub mod display;
pub mod error;
pub mod events;
pub mod focus;
pub mod frame;
pub mod geometry;
pub mod hints;
pub mod manager;
pub mod moveresize;
pub mod presentation;
pub mod registry;
pub mod settings;
pub mod stacking;
pub mod transients;
pub mod x11;

/// X11 window handle
pub type Window = u32;
/// Handle of a managed frame
pub type FrameId = u32;

pub use client::{Client, FocusModel, HintKind};
pub use client_flags::{WindowType, WmProtocols, WmState};
pub use decorations::{DecorPreset, Decorations, Functions};
pub use display::{DisplayServer, ProtocolKind, RawWmHints, WindowHints};
pub use error::{Error, Result};
pub use events::DisplayEvent;
pub use frame::{Frame, Maximized};
pub use geometry::Geometry;
pub use hints::{AppliedSize, Aspect, RawSizeHints, SizeHints};
pub use manager::WindowManager;
pub use moveresize::ResizeEdge;
pub use presentation::{NoopPresentation, Presentation};
pub use settings::{FocusPolicy, Settings};
pub use stacking::layer;
