//! Decorations Module
//!
//! Decoration and function flag sets for a managed frame, driven by
//! presets. A preset is dynamic configuration, not inheritance: each one
//! maps to an explicit pair of flag masks.

use bitflags::bitflags;

bitflags! {
    /// Visual decoration elements of a frame, each independently togglable
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Decorations: u32 {
        const TITLEBAR = 1 << 0;
        const HANDLE   = 1 << 1;
        const BORDER   = 1 << 2;
        const ICONIFY  = 1 << 3;
        const MAXIMIZE = 1 << 4;
        const CLOSE    = 1 << 5;
        const MENU     = 1 << 6;
        const STICKY   = 1 << 7;
        const SHADE    = 1 << 8;
        const TAB      = 1 << 9;
        const ENABLED  = 1 << 10;
    }
}

bitflags! {
    /// Operations the user may perform on a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Functions: u32 {
        const RESIZE   = 1 << 0;
        const MOVE     = 1 << 1;
        const ICONIFY  = 1 << 2;
        const MAXIMIZE = 1 << 3;
        const CLOSE    = 1 << 4;
    }
}

impl Default for Decorations {
    fn default() -> Self {
        DecorPreset::Normal.decorations()
    }
}

impl Default for Functions {
    fn default() -> Self {
        DecorPreset::Normal.functions()
    }
}

/// Decoration preset, used to restore the full mask on demand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecorPreset {
    /// Bare window; only the window menu stays reachable
    None,
    /// Full decorations
    #[default]
    Normal,
    /// Titlebar and iconify button only; not resizable
    Tiny,
    /// Titlebar only, for toolbox-style windows
    Tool,
}

impl DecorPreset {
    pub fn decorations(self) -> Decorations {
        match self {
            DecorPreset::None => Decorations::MENU | Decorations::ENABLED,
            DecorPreset::Normal => {
                Decorations::TITLEBAR
                    | Decorations::HANDLE
                    | Decorations::BORDER
                    | Decorations::ICONIFY
                    | Decorations::MAXIMIZE
                    | Decorations::CLOSE
                    | Decorations::MENU
                    | Decorations::STICKY
                    | Decorations::SHADE
                    | Decorations::TAB
                    | Decorations::ENABLED
            }
            DecorPreset::Tiny => {
                Decorations::TITLEBAR
                    | Decorations::ICONIFY
                    | Decorations::MENU
                    | Decorations::ENABLED
            }
            DecorPreset::Tool => {
                Decorations::TITLEBAR | Decorations::MENU | Decorations::ENABLED
            }
        }
    }

    pub fn functions(self) -> Functions {
        match self {
            DecorPreset::None => Functions::MOVE | Functions::RESIZE | Functions::CLOSE,
            DecorPreset::Normal => {
                Functions::RESIZE
                    | Functions::MOVE
                    | Functions::ICONIFY
                    | Functions::MAXIMIZE
                    | Functions::CLOSE
            }
            DecorPreset::Tiny => Functions::MOVE | Functions::ICONIFY | Functions::CLOSE,
            DecorPreset::Tool => Functions::MOVE | Functions::CLOSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiny_preset_is_not_resizable() {
        assert!(!DecorPreset::Tiny.functions().contains(Functions::RESIZE));
        assert!(!DecorPreset::Tiny.decorations().contains(Decorations::MAXIMIZE));
        assert!(DecorPreset::Tiny.decorations().contains(Decorations::TITLEBAR));
    }

    #[test]
    fn none_preset_keeps_menu() {
        assert!(DecorPreset::None.decorations().contains(Decorations::MENU));
        assert!(!DecorPreset::None.decorations().contains(Decorations::TITLEBAR));
    }
}
