//! Client Module
//!
//! One top-level application window's logical identity: its hints
//! snapshot, announced protocols, transient edge and back-reference to
//! the frame that holds it.

use tracing::debug;

use crate::client_flags::{WindowType, WmProtocols, WmState};
use crate::display::{DisplayServer, ProtocolKind, RawWmHints, WindowHints};
use crate::error::Result;
use crate::hints::SizeHints;
use crate::{FrameId, Window};

/// Very long titles have historically been able to wedge the manager, so
/// they are clamped.
const MAX_TITLE_LEN: usize = 512;

/// Hint categories a property change can refresh individually
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Title,
    Normal,
    Protocols,
    WmHints,
    Class,
    TransientFor,
}

/// ICCCM input model, derived from the input field and WM_TAKE_FOCUS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusModel {
    NoInput,
    Passive,
    LocallyActive,
    GloballyActive,
}

/// One managed client window
#[derive(Debug)]
pub struct Client {
    pub window: Window,

    pub title: String,
    /// A user-assigned title wins over further title hints
    title_override: bool,
    pub instance_name: String,
    pub class_name: String,

    pub size_hints: SizeHints,
    pub protocols: WmProtocols,
    pub accepts_input: bool,
    pub initial_state: WmState,
    pub urgent: bool,
    pub window_type: WindowType,

    /// This client blocks interaction with its transient parent
    pub modal: bool,
    /// Number of modal windows transient (directly or through re-links)
    /// for this client
    pub modal_count: u32,

    /// Resolved transient parent, if any
    pub transient_for: Option<Window>,
    /// Clients that declare this one as their transient parent
    pub transients: Vec<Window>,
    /// Handle the client *declared* as its transient parent, resolved or not
    pub transient_for_hint: Option<Window>,

    /// Left neighbor in tab order; preserved across frame merges
    pub group_left: Option<Window>,

    /// Owning frame, none until attached
    pub frame: Option<FrameId>,
}

impl Client {
    pub fn new(window: Window, hints: &WindowHints) -> Self {
        let wm = hints.wm.unwrap_or_default();
        Self {
            window,
            title: clamp_title(&hints.title),
            title_override: false,
            instance_name: hints.instance_name.clone(),
            class_name: hints.class_name.clone(),
            size_hints: SizeHints::from_raw(hints.normal.as_ref()),
            protocols: hints.protocols,
            accepts_input: wm.input.unwrap_or(true),
            initial_state: wm.initial_state.unwrap_or(WmState::Normal),
            urgent: wm.urgent,
            window_type: hints.window_type,
            modal: hints.modal,
            modal_count: 0,
            transient_for: None,
            transients: Vec::new(),
            transient_for_hint: hints.transient_for,
            group_left: None,
            frame: None,
        }
    }

    /// Refresh the title from a hint change. Returns whether it changed.
    pub fn update_title(&mut self, title: &str) -> bool {
        if self.title_override {
            return false;
        }
        let title = clamp_title(title);
        if title == self.title {
            return false;
        }
        self.title = title;
        true
    }

    /// Pin a user-assigned title; hint updates no longer touch it.
    pub fn set_title_user(&mut self, title: &str) {
        self.title = clamp_title(title);
        self.title_override = true;
    }

    /// Refresh WM hints (input model flag, initial state, urgency).
    pub fn update_wm_hints(&mut self, wm: Option<&RawWmHints>) {
        let wm = wm.copied().unwrap_or_default();
        self.accepts_input = wm.input.unwrap_or(true);
        self.initial_state = wm.initial_state.unwrap_or(WmState::Normal);
        self.urgent = wm.urgent;
    }

    pub fn update_protocols(&mut self, protocols: WmProtocols) {
        self.protocols = protocols;
    }

    pub fn update_class(&mut self, instance: &str, class: &str) {
        self.instance_name = instance.to_string();
        self.class_name = class.to_string();
    }

    /// Refresh size hints. Returns true when the owning frame must
    /// re-clamp its current geometry.
    pub fn update_size_hints(&mut self, hints: SizeHints) -> bool {
        if hints == self.size_hints {
            return false;
        }
        self.size_hints = hints;
        true
    }

    /// ICCCM 4.1.7 input model:
    ///
    /// | model           | input field | WM_TAKE_FOCUS |
    /// |-----------------|-------------|---------------|
    /// | No Input        | false       | absent        |
    /// | Passive         | true        | absent        |
    /// | Locally Active  | true        | present       |
    /// | Globally Active | false       | present       |
    pub fn focus_model(&self) -> FocusModel {
        match (self.accepts_input, self.protocols.contains(WmProtocols::TAKE_FOCUS)) {
            (false, false) => FocusModel::NoInput,
            (true, false) => FocusModel::Passive,
            (true, true) => FocusModel::LocallyActive,
            (false, true) => FocusModel::GloballyActive,
        }
    }

    /// Whether any focus attempt on this client is worth making. Docks and
    /// splash screens must never steal focus.
    pub fn accepts_focus(&self) -> bool {
        (self.accepts_input || self.protocols.contains(WmProtocols::TAKE_FOCUS))
            && self.window_type != WindowType::Dock
            && self.window_type != WindowType::Splash
    }

    /// Issue a focus attempt per the input model. Returns whether one was
    /// issued; the focus change itself may still not happen.
    pub fn send_focus<D: DisplayServer>(&self, display: &D) -> bool {
        if self.accepts_input {
            if let Err(err) = display.set_input_focus(self.window) {
                debug!("focus attempt on 0x{:x} failed: {}", self.window, err);
                return false;
            }
            return true;
        }
        if !self.protocols.contains(WmProtocols::TAKE_FOCUS) {
            return false;
        }
        if let Err(err) = display.send_protocol_message(self.window, ProtocolKind::TakeFocus) {
            debug!("take-focus message to 0x{:x} failed: {}", self.window, err);
            return false;
        }
        true
    }

    /// Ask the window to close. Falls back to killing the connection when
    /// the client never announced WM_DELETE_WINDOW or `forceful` is set.
    pub fn request_close<D: DisplayServer>(&self, display: &D, forceful: bool) -> Result<()> {
        if forceful || !self.protocols.contains(WmProtocols::DELETE) {
            display.kill_client(self.window)
        } else {
            display.send_protocol_message(self.window, ProtocolKind::Delete)
        }
    }

    /// Modal either by its own flag or by holding modal descendants.
    pub fn is_modal(&self) -> bool {
        self.modal || self.modal_count > 0
    }

    pub fn add_modal(&mut self) {
        self.modal_count += 1;
    }

    pub fn remove_modal(&mut self) {
        self.modal_count = self.modal_count.saturating_sub(1);
    }

    pub fn is_transient(&self) -> bool {
        self.transient_for.is_some()
    }
}

fn clamp_title(title: &str) -> String {
    if title.len() <= MAX_TITLE_LEN {
        return title.to_string();
    }
    let mut end = MAX_TITLE_LEN;
    while !title.is_char_boundary(end) {
        end -= 1;
    }
    title[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_client() -> Client {
        Client::new(0x100, &WindowHints::default())
    }

    #[test]
    fn focus_model_matrix() {
        let mut c = plain_client();
        c.accepts_input = false;
        c.protocols = WmProtocols::empty();
        assert_eq!(c.focus_model(), FocusModel::NoInput);

        c.accepts_input = true;
        assert_eq!(c.focus_model(), FocusModel::Passive);

        c.protocols = WmProtocols::TAKE_FOCUS;
        assert_eq!(c.focus_model(), FocusModel::LocallyActive);

        c.accepts_input = false;
        assert_eq!(c.focus_model(), FocusModel::GloballyActive);
    }

    #[test]
    fn docks_and_splashes_never_accept_focus() {
        let mut c = plain_client();
        c.accepts_input = true;
        c.window_type = WindowType::Dock;
        assert!(!c.accepts_focus());
        c.window_type = WindowType::Splash;
        assert!(!c.accepts_focus());
        c.window_type = WindowType::Dialog;
        assert!(c.accepts_focus());
    }

    #[test]
    fn user_title_pins_against_hint_updates() {
        let mut c = plain_client();
        assert!(c.update_title("xterm"));
        c.set_title_user("my shell");
        assert!(!c.update_title("xterm (2)"));
        assert_eq!(c.title, "my shell");
    }

    #[test]
    fn overlong_titles_are_clamped() {
        let mut c = plain_client();
        c.update_title(&"x".repeat(4096));
        assert_eq!(c.title.len(), 512);
    }
}
