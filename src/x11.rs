//! X11 Module
//!
//! x11rb-backed [`DisplayServer`] implementation over a synchronous
//! RustConnection. Owns the interned atoms and the translation between
//! raw X11 properties and the hint snapshot the model consumes.

use anyhow::Result as AnyResult;
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::properties::{WmClass, WmHints as XWmHints, WmHintsState, WmSizeHints};
use x11rb::protocol::xproto::{ClientMessageEvent, *};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::client_flags::{WindowType, WmProtocols, WmState};
use crate::display::{DisplayServer, ProtocolKind, RawWmHints, WindowHints};
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::hints::{Aspect, RawSizeHints};
use crate::Window as WindowId;

/// Interned atoms the display layer needs
#[derive(Debug)]
pub struct Atoms {
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_take_focus: Atom,
    pub wm_state: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_modal: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_desktop: Atom,
    pub net_wm_window_type_dock: Atom,
    pub net_wm_window_type_dialog: Atom,
    pub net_wm_window_type_toolbar: Atom,
    pub net_wm_window_type_menu: Atom,
    pub net_wm_window_type_utility: Atom,
    pub net_wm_window_type_splash: Atom,
    pub net_wm_window_type_notification: Atom,
}

impl Atoms {
    pub fn new<C: Connection>(conn: &C) -> AnyResult<Self> {
        let intern = |name: &str| -> AnyResult<Atom> {
            Ok(conn.intern_atom(false, name.as_bytes())?.reply()?.atom)
        };

        Ok(Self {
            wm_protocols: intern("WM_PROTOCOLS")?,
            wm_delete_window: intern("WM_DELETE_WINDOW")?,
            wm_take_focus: intern("WM_TAKE_FOCUS")?,
            wm_state: intern("WM_STATE")?,
            net_wm_name: intern("_NET_WM_NAME")?,
            utf8_string: intern("UTF8_STRING")?,
            net_wm_state: intern("_NET_WM_STATE")?,
            net_wm_state_modal: intern("_NET_WM_STATE_MODAL")?,
            net_wm_window_type: intern("_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_desktop: intern("_NET_WM_WINDOW_TYPE_DESKTOP")?,
            net_wm_window_type_dock: intern("_NET_WM_WINDOW_TYPE_DOCK")?,
            net_wm_window_type_dialog: intern("_NET_WM_WINDOW_TYPE_DIALOG")?,
            net_wm_window_type_toolbar: intern("_NET_WM_WINDOW_TYPE_TOOLBAR")?,
            net_wm_window_type_menu: intern("_NET_WM_WINDOW_TYPE_MENU")?,
            net_wm_window_type_utility: intern("_NET_WM_WINDOW_TYPE_UTILITY")?,
            net_wm_window_type_splash: intern("_NET_WM_WINDOW_TYPE_SPLASH")?,
            net_wm_window_type_notification: intern("_NET_WM_WINDOW_TYPE_NOTIFICATION")?,
        })
    }
}

pub struct X11Display {
    conn: RustConnection,
    root: WindowId,
    atoms: Atoms,
}

impl X11Display {
    /// Connect to the display named by DISPLAY and intern the atom set.
    pub fn connect() -> AnyResult<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)?;
        Ok(Self { conn, root, atoms })
    }

    pub fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    pub fn connection(&self) -> &RustConnection {
        &self.conn
    }

    fn failed(window: WindowId, err: impl std::fmt::Display) -> Error {
        Error::ProtocolQueryFailure {
            window,
            reason: err.to_string(),
        }
    }

    fn read_text_property(&self, window: WindowId, property: Atom) -> Option<String> {
        let reply = self
            .conn
            .get_property(false, window, property, AtomEnum::ANY, 0, u32::MAX)
            .ok()?
            .reply()
            .ok()?;
        if reply.value.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&reply.value).into_owned())
    }

    fn read_title(&self, window: WindowId) -> String {
        self.read_text_property(window, self.atoms.net_wm_name)
            .or_else(|| self.read_text_property(window, AtomEnum::WM_NAME.into()))
            .unwrap_or_default()
    }

    fn read_protocols(&self, window: WindowId) -> WmProtocols {
        let mut protocols = WmProtocols::empty();
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.wm_protocols,
                AtomEnum::ATOM,
                0,
                u32::MAX,
            )
            .ok()
            .and_then(|c| c.reply().ok());
        if let Some(values) = reply.as_ref().and_then(|r| r.value32()) {
            for atom in values {
                if atom == self.atoms.wm_delete_window {
                    protocols.insert(WmProtocols::DELETE);
                } else if atom == self.atoms.wm_take_focus {
                    protocols.insert(WmProtocols::TAKE_FOCUS);
                }
            }
        }
        protocols
    }

    fn read_window_type(&self, window: WindowId) -> WindowType {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.net_wm_window_type,
                AtomEnum::ATOM,
                0,
                u32::MAX,
            )
            .ok()
            .and_then(|c| c.reply().ok());
        let first = reply.as_ref().and_then(|r| r.value32()?.next());
        match first {
            Some(a) if a == self.atoms.net_wm_window_type_desktop => WindowType::Desktop,
            Some(a) if a == self.atoms.net_wm_window_type_dock => WindowType::Dock,
            Some(a) if a == self.atoms.net_wm_window_type_dialog => WindowType::Dialog,
            Some(a) if a == self.atoms.net_wm_window_type_toolbar => WindowType::Toolbar,
            Some(a) if a == self.atoms.net_wm_window_type_menu => WindowType::Menu,
            Some(a) if a == self.atoms.net_wm_window_type_utility => WindowType::Utility,
            Some(a) if a == self.atoms.net_wm_window_type_splash => WindowType::Splash,
            Some(a) if a == self.atoms.net_wm_window_type_notification => {
                WindowType::Notification
            }
            _ => WindowType::Normal,
        }
    }

    fn read_modal(&self, window: WindowId) -> bool {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                self.atoms.net_wm_state,
                AtomEnum::ATOM,
                0,
                u32::MAX,
            )
            .ok()
            .and_then(|c| c.reply().ok());
        reply
            .as_ref()
            .and_then(|r| r.value32())
            .map(|mut values| values.any(|a| a == self.atoms.net_wm_state_modal))
            .unwrap_or(false)
    }

    fn read_transient_for(&self, window: WindowId) -> Option<WindowId> {
        let reply = self
            .conn
            .get_property(
                false,
                window,
                AtomEnum::WM_TRANSIENT_FOR,
                AtomEnum::WINDOW,
                0,
                1,
            )
            .ok()?
            .reply()
            .ok()?;
        let mut values = reply.value32()?;
        values.next()
    }

    fn read_normal_hints(&self, window: WindowId) -> Option<RawSizeHints> {
        // The reply is Ok(None) when the property is simply absent.
        let hints = WmSizeHints::get_normal_hints(&self.conn, window)
            .ok()?
            .reply()
            .ok()??;

        let pair = |opt: Option<(i32, i32)>| {
            opt.map(|(a, b)| (a.max(0) as u32, b.max(0) as u32))
        };
        Some(RawSizeHints {
            min_size: pair(hints.min_size),
            max_size: pair(hints.max_size),
            size_inc: pair(hints.size_increment),
            base_size: pair(hints.base_size),
            aspect: hints.aspect.map(|(min, max)| {
                (
                    Aspect::new(min.numerator.max(0) as u32, min.denominator.max(0) as u32),
                    Aspect::new(max.numerator.max(0) as u32, max.denominator.max(0) as u32),
                )
            }),
            win_gravity: hints.win_gravity.map(|g| u32::from(g) as u8),
        })
    }

    fn read_wm_hints(&self, window: WindowId) -> Option<RawWmHints> {
        let hints = XWmHints::get(&self.conn, window).ok()?.reply().ok()??;
        Some(RawWmHints {
            input: hints.input,
            initial_state: hints.initial_state.map(|state| match state {
                WmHintsState::Normal => WmState::Normal,
                WmHintsState::Iconic => WmState::Iconic,
            }),
            urgent: hints.urgent,
        })
    }

    fn read_class(&self, window: WindowId) -> (String, String) {
        match WmClass::get(&self.conn, window)
            .ok()
            .and_then(|c| c.reply().ok())
            .flatten()
        {
            Some(class) => (
                String::from_utf8_lossy(class.instance()).into_owned(),
                String::from_utf8_lossy(class.class()).into_owned(),
            ),
            None => (String::new(), String::new()),
        }
    }

    fn flush(&self, window: WindowId) -> Result<()> {
        self.conn.flush().map_err(|e| Self::failed(window, e))
    }
}

impl DisplayServer for X11Display {
    fn root(&self) -> WindowId {
        self.root
    }

    fn query_geometry(&self, window: WindowId) -> Result<Geometry> {
        let geometry = self
            .conn
            .get_geometry(window)
            .map_err(|e| Self::failed(window, e))?
            .reply()
            .map_err(|e| Self::failed(window, e))?;
        Ok(Geometry::new(
            geometry.x as i32,
            geometry.y as i32,
            geometry.width as u32,
            geometry.height as u32,
        ))
    }

    fn query_hints(&self, window: WindowId) -> Result<WindowHints> {
        // The window must at least still exist; individual missing
        // properties are normal and fall back to defaults.
        if !self.window_exists(window) {
            return Err(Error::StaleReference(window));
        }
        let (instance_name, class_name) = self.read_class(window);
        Ok(WindowHints {
            title: self.read_title(window),
            instance_name,
            class_name,
            normal: self.read_normal_hints(window),
            wm: self.read_wm_hints(window),
            protocols: self.read_protocols(window),
            window_type: self.read_window_type(window),
            modal: self.read_modal(window),
            transient_for: self.read_transient_for(window),
        })
    }

    fn get_property(&self, window: WindowId, key: &str) -> Result<Option<Vec<u8>>> {
        let atom = self
            .conn
            .intern_atom(false, key.as_bytes())
            .map_err(|e| Self::failed(window, e))?
            .reply()
            .map_err(|e| Self::failed(window, e))?
            .atom;
        let reply = self
            .conn
            .get_property(false, window, atom, AtomEnum::ANY, 0, u32::MAX)
            .map_err(|e| Self::failed(window, e))?
            .reply()
            .map_err(|e| Self::failed(window, e))?;
        if reply.type_ == u32::from(AtomEnum::NONE) {
            Ok(None)
        } else {
            Ok(Some(reply.value))
        }
    }

    fn set_property(&self, window: WindowId, key: &str, data: &[u8]) -> Result<()> {
        let atom = self
            .conn
            .intern_atom(false, key.as_bytes())
            .map_err(|e| Self::failed(window, e))?
            .reply()
            .map_err(|e| Self::failed(window, e))?
            .atom;
        // Word-aligned payloads go out as 32-bit data, which covers the
        // WM_STATE publish; everything else is an opaque byte blob.
        if !data.is_empty() && data.len() % 4 == 0 {
            let words: Vec<u32> = data
                .chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            self.conn
                .change_property32(PropMode::REPLACE, window, atom, AtomEnum::CARDINAL, &words)
                .map_err(|e| Self::failed(window, e))?;
        } else {
            self.conn
                .change_property8(PropMode::REPLACE, window, atom, AtomEnum::STRING, data)
                .map_err(|e| Self::failed(window, e))?;
        }
        self.flush(window)
    }

    fn send_protocol_message(&self, window: WindowId, kind: ProtocolKind) -> Result<()> {
        let protocol = match kind {
            ProtocolKind::Delete => self.atoms.wm_delete_window,
            ProtocolKind::TakeFocus => self.atoms.wm_take_focus,
        };
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.wm_protocols,
            [protocol, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        self.conn
            .send_event(false, window, EventMask::NO_EVENT, event)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn set_input_focus(&self, window: WindowId) -> Result<()> {
        self.conn
            .set_input_focus(InputFocus::POINTER_ROOT, window, x11rb::CURRENT_TIME)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn grab_pointer(&self, window: WindowId) -> Result<()> {
        let reply = self
            .conn
            .grab_pointer(
                false,
                window,
                EventMask::POINTER_MOTION | EventMask::BUTTON_RELEASE,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                x11rb::CURRENT_TIME,
            )
            .map_err(|e| Self::failed(window, e))?
            .reply()
            .map_err(|e| Self::failed(window, e))?;
        if reply.status != GrabStatus::SUCCESS {
            return Err(Self::failed(window, format!("grab status {:?}", reply.status)));
        }
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.conn
            .ungrab_pointer(x11rb::CURRENT_TIME)
            .map_err(|e| Self::failed(self.root, e))?;
        self.flush(self.root)
    }

    fn map_window(&self, window: WindowId) -> Result<()> {
        self.conn
            .map_window(window)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn unmap_window(&self, window: WindowId) -> Result<()> {
        self.conn
            .unmap_window(window)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn reparent(&self, window: WindowId, new_parent: WindowId, x: i32, y: i32) -> Result<()> {
        self.conn
            .reparent_window(window, new_parent, x as i16, y as i16)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn configure(&self, window: WindowId, geometry: Geometry) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new()
                    .x(geometry.x)
                    .y(geometry.y)
                    .width(geometry.width)
                    .height(geometry.height),
            )
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn raise_in_stack(&self, window: WindowId) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
            )
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn lower_in_stack(&self, window: WindowId) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new().stack_mode(StackMode::BELOW),
            )
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn restack_above(&self, window: WindowId, sibling: WindowId) -> Result<()> {
        self.conn
            .configure_window(
                window,
                &ConfigureWindowAux::new()
                    .sibling(sibling)
                    .stack_mode(StackMode::ABOVE),
            )
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn change_border_width(&self, window: WindowId, px: u32) -> Result<()> {
        self.conn
            .configure_window(window, &ConfigureWindowAux::new().border_width(px))
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn kill_client(&self, window: WindowId) -> Result<()> {
        debug!("killing client 0x{:x}", window);
        self.conn
            .kill_client(window)
            .map_err(|e| Self::failed(window, e))?;
        self.flush(window)
    }

    fn window_exists(&self, window: WindowId) -> bool {
        self.conn
            .get_geometry(window)
            .ok()
            .and_then(|c| c.reply().ok())
            .is_some()
    }
}
