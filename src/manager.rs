//! Manager Module
//!
//! Ties the pieces together: client registry, frames, focus, stacking and
//! the display-server connection. Owns the lifecycle of every managed
//! window from map request to destruction, the tab attach/detach moves
//! and the frame state machine.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::client::{Client, HintKind};
use crate::client_flags::{WindowType, WmState};
use crate::decorations::DecorPreset;
use crate::display::{DisplayServer, WindowHints};
use crate::error::{Error, Result};
use crate::focus::FocusManager;
use crate::frame::Frame;
use crate::geometry::Geometry;
use crate::moveresize::MoveResizeSession;
use crate::presentation::{NoopPresentation, Presentation};
use crate::registry::ClientRegistry;
use crate::settings::Settings;
use crate::stacking::{layer, StackingManager};
use crate::transients;
use crate::{FrameId, Window};

pub struct WindowManager<D: DisplayServer> {
    pub settings: Settings,
    pub registry: ClientRegistry,
    pub(crate) frames: HashMap<FrameId, Frame>,
    next_frame: FrameId,
    pub(crate) focus: FocusManager,
    pub(crate) stacking: StackingManager,
    pub(crate) session: Option<MoveResizeSession>,
    pub(crate) display: D,
    pub(crate) presentation: Box<dyn Presentation>,
    pub(crate) current_workspace: u32,
    /// During session restore, iconic initial-state hints are honored
    /// instead of mapping the window.
    pub restoring_session: bool,
}

impl<D: DisplayServer> WindowManager<D> {
    pub fn new(display: D, settings: Settings) -> Self {
        let root = display.root();
        Self {
            settings,
            registry: ClientRegistry::new(root),
            frames: HashMap::new(),
            next_frame: 1,
            focus: FocusManager::new(),
            stacking: StackingManager::new(),
            session: None,
            display,
            presentation: Box::new(NoopPresentation),
            current_workspace: 0,
            restoring_session: false,
        }
    }

    pub fn set_presentation(&mut self, presentation: Box<dyn Presentation>) {
        self.presentation = presentation;
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn frame(&self, frame_id: FrameId) -> Option<&Frame> {
        self.frames.get(&frame_id)
    }

    pub fn frame_of(&self, window: Window) -> Option<FrameId> {
        self.registry.get(window).and_then(|c| c.frame)
    }

    pub fn focused(&self) -> Option<Window> {
        self.focus.focused()
    }

    /// Frames bottom-to-top.
    pub fn stacking_order(&self) -> Vec<FrameId> {
        self.stacking.order().collect()
    }

    pub fn current_workspace(&self) -> u32 {
        self.current_workspace
    }

    // ---- lifecycle --------------------------------------------------

    /// Bring a top-level window under management: snapshot its hints,
    /// register it, wrap it in a fresh frame and show it.
    pub fn manage_window(&mut self, window: Window) -> Result<FrameId> {
        if self.registry.contains(window) {
            return self
                .frame_of(window)
                .ok_or(Error::LookupFailure(window));
        }

        let hints = self.display.query_hints(window)?;
        let mut geometry = self.display.query_geometry(window)?;

        let client = Client::new(window, &hints);
        let applied = client.size_hints.apply(geometry.width, geometry.height, false);
        geometry.width = applied.width;
        geometry.height = applied.height;

        let fixed_size = client.size_hints.is_fixed_size();
        let initial_state = client.initial_state;
        let window_type = client.window_type;
        info!(
            "managing 0x{:x} \"{}\" ({}x{} at {},{})",
            window, client.title, geometry.width, geometry.height, geometry.x, geometry.y
        );
        self.registry.register(client);

        let frame_id = self.create_frame(window, geometry, initial_layer(window_type));
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.apply_preset(decor_preset(window_type));
            if fixed_size {
                frame.restrict_to_fixed_size();
            }
            frame.workspace = self.current_workspace;
        }
        if let Some(client) = self.registry.get_mut(window) {
            client.frame = Some(frame_id);
        }
        self.presentation.frame_created(frame_id);
        self.presentation.tab_added(frame_id, window);

        if let Err(err) = self
            .display
            .change_border_width(window, self.settings.border_width)
        {
            debug!("border width on 0x{:x} failed: {}", window, err);
        }

        if self.restoring_session && initial_state == WmState::Iconic {
            self.iconify(frame_id);
        } else {
            self.show_frame(frame_id);
            self.raise(frame_id);
            let wants_focus = self.settings.focus_new
                && self.registry.get(window).map(|c| c.accepts_focus()) == Some(true);
            if wants_focus {
                self.focus_client(window);
            }
        }
        Ok(frame_id)
    }

    /// Forget a window entirely: unlink it from its frame and tab chain,
    /// tear the frame down when it drains, and repair focus.
    pub fn unmanage(&mut self, window: Window) {
        let Some(frame_id) = self.frame_of(window) else {
            self.registry.unregister(window);
            self.focus.forget(window);
            return;
        };
        debug!("unmanaging 0x{:x} from frame {}", window, frame_id);

        self.unlink_tab(window);
        let emptied = match self.frames.get_mut(&frame_id) {
            Some(frame) => {
                frame.remove_client(window);
                frame.is_empty()
            }
            None => false,
        };
        self.presentation.tab_removed(frame_id, window);

        if emptied {
            self.destroy_frame(frame_id);
        } else if let Some(frame) = self.frames.get(&frame_id) {
            self.presentation.active_tab_changed(frame_id, frame.active);
        }

        self.registry.unregister(window);
        self.presentation.client_destroyed(window);

        let had_focus = self.focus.focused() == Some(window);
        self.focus.forget(window);
        if had_focus {
            self.revert_focus();
        }
    }

    /// Ask a client to close itself, or sever its connection when it
    /// never announced the delete protocol or `forceful` is set.
    pub fn close_client(&mut self, window: Window, forceful: bool) -> Result<()> {
        let client = self
            .registry
            .get(window)
            .ok_or(Error::LookupFailure(window))?;
        client.request_close(&self.display, forceful)
    }

    /// Close every tab in a frame.
    pub fn close_frame(&mut self, frame_id: FrameId, forceful: bool) {
        let clients = match self.frames.get(&frame_id) {
            Some(frame) => frame.clients.clone(),
            None => return,
        };
        for window in clients {
            if let Err(err) = self.close_client(window, forceful) {
                warn!("close request for 0x{:x} failed: {}", window, err);
            }
        }
    }

    // ---- tab group moves --------------------------------------------

    /// Merge the frame holding `window` into `target`: every tab of the
    /// donor frame migrates in order and the donor is destroyed. Tab
    /// neighbor links survive the move, except that the first migrated
    /// tab's left neighbor becomes the target's old tail.
    pub fn attach(&mut self, target: FrameId, window: Window) -> Result<()> {
        let donor = self.frame_of(window).ok_or(Error::LookupFailure(window))?;
        if donor == target {
            return Ok(());
        }
        let donor_frame = self.frames.get(&donor).ok_or(Error::StaleReference(window))?;
        let migrated = donor_frame.clients.clone();

        let target_frame = self
            .frames
            .get_mut(&target)
            .ok_or(Error::StaleReference(window))?;
        let old_tail = target_frame.clients.last().copied();
        target_frame.clients.extend_from_slice(&migrated);
        let (workspace, stuck, state) =
            (target_frame.workspace, target_frame.stuck, target_frame.state);

        for (i, &moved) in migrated.iter().enumerate() {
            if let Some(client) = self.registry.get_mut(moved) {
                client.frame = Some(target);
                if i == 0 {
                    client.group_left = old_tail;
                }
            }
            self.presentation.tab_added(target, moved);
        }

        self.frames.remove(&donor);
        self.stacking.remove(donor);
        self.presentation.frame_destroyed(donor);

        self.presentation.state_changed(target, state);
        self.presentation
            .workspace_changed(target, workspace, stuck);

        // The client named in the request ends up as the active tab,
        // whatever the donor's active tab was.
        if let Some(frame) = self.frames.get_mut(&target) {
            frame.set_active(window);
        }
        self.presentation.active_tab_changed(target, Some(window));
        self.raise(target);
        self.focus_client(window);
        Ok(())
    }

    /// Split one tab out of a shared frame into a fresh frame of its own.
    /// A sole tab has nothing to detach from.
    pub fn detach(&mut self, window: Window) -> Result<FrameId> {
        let frame_id = self.frame_of(window).ok_or(Error::LookupFailure(window))?;
        let frame = self
            .frames
            .get(&frame_id)
            .ok_or(Error::StaleReference(window))?;
        if frame.len() <= 1 {
            return Ok(frame_id);
        }
        let (geometry, workspace, stuck, frame_layer) =
            (frame.geometry, frame.workspace, frame.stuck, frame.layer);

        self.unlink_tab(window);
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.remove_client(window);
        }
        self.presentation.tab_removed(frame_id, window);
        if let Some(frame) = self.frames.get(&frame_id) {
            self.presentation.active_tab_changed(frame_id, frame.active);
        }

        let new_frame = self.create_frame(window, geometry, frame_layer);
        if let Some(frame) = self.frames.get_mut(&new_frame) {
            frame.workspace = workspace;
            frame.stuck = stuck;
        }
        if let Some(client) = self.registry.get_mut(window) {
            client.frame = Some(new_frame);
            client.group_left = None;
        }
        self.presentation.frame_created(new_frame);
        self.presentation.tab_added(new_frame, window);
        self.show_frame(new_frame);
        self.raise(new_frame);
        Ok(new_frame)
    }

    /// Make `window` its frame's active tab and focus it.
    pub fn set_current_client(&mut self, window: Window) -> bool {
        let Some(frame_id) = self.frame_of(window) else {
            return false;
        };
        if self.frames.get_mut(&frame_id).map(|f| f.set_active(window)) != Some(true) {
            return false;
        }
        self.presentation.active_tab_changed(frame_id, Some(window));
        if self.settings.raise_on_focus {
            self.raise(frame_id);
        }
        self.focus_client(window)
    }

    pub fn next_tab(&mut self, frame_id: FrameId) {
        if let Some(active) = self.frames.get_mut(&frame_id).and_then(|f| f.next_client()) {
            self.presentation.active_tab_changed(frame_id, Some(active));
            self.focus_client(active);
        }
    }

    pub fn prev_tab(&mut self, frame_id: FrameId) {
        if let Some(active) = self.frames.get_mut(&frame_id).and_then(|f| f.prev_client()) {
            self.presentation.active_tab_changed(frame_id, Some(active));
            self.focus_client(active);
        }
    }

    // ---- state machine ----------------------------------------------

    /// Iconify a frame and, through the transient forest, the rest of its
    /// chain: a dialog never stays up without its parent, and a parent
    /// never stays up while its dialog is hidden.
    pub fn iconify(&mut self, frame_id: FrameId) {
        let clients = match self.frames.get_mut(&frame_id) {
            Some(frame) if !frame.op_lock && frame.state != WmState::Iconic => {
                frame.op_lock = true;
                frame.state = WmState::Iconic;
                frame.clients.clone()
            }
            _ => return,
        };

        self.hide_frame(frame_id);
        self.publish_state(&clients, WmState::Iconic);
        self.presentation.state_changed(frame_id, WmState::Iconic);

        for &window in &clients {
            let parent_frame = self
                .registry
                .get(window)
                .and_then(|c| c.transient_for)
                .and_then(|p| self.registry.get(p))
                .and_then(|p| p.frame);
            if let Some(parent_frame) = parent_frame {
                if self.frames.get(&parent_frame).map(|f| f.is_iconic()) == Some(false) {
                    self.iconify(parent_frame);
                }
            }
        }
        for child in self.transient_frames_of(&clients) {
            self.iconify(child);
        }
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.op_lock = false;
        }

        if self
            .focus
            .focused()
            .map(|w| clients.contains(&w))
            .unwrap_or(false)
        {
            self.focus.clear_focused();
            self.revert_focus();
        }
    }

    /// Restore an iconified frame. Dialogs come back with it, and a
    /// dialog being restored drags its still-iconic parent back first.
    pub fn deiconify(&mut self, frame_id: FrameId) {
        let clients = match self.frames.get_mut(&frame_id) {
            Some(frame) if !frame.op_lock && frame.state == WmState::Iconic => {
                frame.op_lock = true;
                frame.state = WmState::Normal;
                frame.clients.clone()
            }
            _ => return,
        };

        // Reassociate with the parent before showing ourselves.
        for &window in &clients {
            let parent_frame = self
                .registry
                .get(window)
                .and_then(|c| c.transient_for)
                .and_then(|p| self.registry.get(p))
                .and_then(|p| p.frame);
            if let Some(parent_frame) = parent_frame {
                self.deiconify(parent_frame);
            }
        }

        self.show_frame(frame_id);
        self.publish_state(&clients, WmState::Normal);
        self.presentation.state_changed(frame_id, WmState::Normal);

        for child in self.transient_frames_of(&clients) {
            self.deiconify(child);
        }
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.op_lock = false;
        }
    }

    /// The client withdrew itself; it stays registered but leaves the
    /// screen until it maps again.
    pub fn withdraw(&mut self, window: Window) {
        let Some(frame_id) = self.frame_of(window) else {
            return;
        };
        // A withdrawal cancels any drag in flight on the same frame.
        if self.session.as_ref().map(|s| s.frame) == Some(frame_id) {
            self.abort_moveresize();
        }
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            if frame.state == WmState::Withdrawn {
                return;
            }
            frame.state = WmState::Withdrawn;
        }
        self.hide_frame(frame_id);
        self.publish_state(&[window], WmState::Withdrawn);
        self.presentation.state_changed(frame_id, WmState::Withdrawn);
    }

    pub fn shade(&mut self, frame_id: FrameId) {
        let Some(frame) = self.frames.get_mut(&frame_id) else {
            return;
        };
        let Some(state) = frame.toggle_shade() else {
            debug!("frame {} has no titlebar, not shading", frame_id);
            return;
        };
        let (shaded, clients) = (frame.shaded, frame.clients.clone());
        self.publish_state(&clients, state);
        self.presentation.shade_changed(frame_id, shaded);
    }

    /// Toggle workspace omnipresence.
    pub fn stick(&mut self, frame_id: FrameId) {
        let Some(frame) = self.frames.get_mut(&frame_id) else {
            return;
        };
        frame.toggle_stick();
        let (workspace, stuck) = (frame.workspace, frame.stuck);
        self.presentation
            .workspace_changed(frame_id, workspace, stuck);
    }

    pub fn set_workspace(&mut self, frame_id: FrameId, workspace: u32) {
        let workspace = workspace.min(self.settings.workspace_count.saturating_sub(1));
        let Some(frame) = self.frames.get_mut(&frame_id) else {
            return;
        };
        if frame.workspace == workspace {
            return;
        }
        frame.workspace = workspace;
        let stuck = frame.stuck;
        let normal = frame.state == WmState::Normal;
        // An iconic frame keeps its windows unmapped until deiconify.
        if normal && (stuck || workspace == self.current_workspace) {
            self.show_frame(frame_id);
        } else if normal {
            self.hide_frame(frame_id);
        }
        self.presentation
            .workspace_changed(frame_id, workspace, stuck);
    }

    pub fn switch_workspace(&mut self, workspace: u32) {
        let workspace = workspace.min(self.settings.workspace_count.saturating_sub(1));
        if workspace == self.current_workspace {
            return;
        }
        self.current_workspace = workspace;
        let frames: Vec<FrameId> = self.frames.keys().copied().collect();
        for frame_id in frames {
            let Some(frame) = self.frames.get(&frame_id) else {
                continue;
            };
            if frame.state != WmState::Normal {
                continue;
            }
            if frame.stuck || frame.workspace == workspace {
                self.show_frame(frame_id);
            } else {
                self.hide_frame(frame_id);
            }
        }
    }

    // ---- maximize ---------------------------------------------------

    pub fn maximize_full(&mut self, frame_id: FrameId) {
        self.maximize_with(frame_id, Frame::toggle_maximize_full);
    }

    pub fn maximize_horizontal(&mut self, frame_id: FrameId) {
        self.maximize_with(frame_id, Frame::toggle_maximize_horizontal);
    }

    pub fn maximize_vertical(&mut self, frame_id: FrameId) {
        self.maximize_with(frame_id, Frame::toggle_maximize_vertical);
    }

    fn maximize_with(&mut self, frame_id: FrameId, toggle: fn(&mut Frame, Geometry)) {
        let Some(frame) = self.frames.get(&frame_id) else {
            return;
        };
        if !frame.is_maximizable() || frame.shaded {
            return;
        }
        let active = frame.active;
        let screen = match self.display.query_geometry(self.registry.root()) {
            Ok(geometry) => geometry,
            Err(err) => {
                warn!("screen geometry query failed: {}", err);
                return;
            }
        };

        // Honor resize increments even at full size; the window may end
        // up slightly short of the screen edge.
        let target = match active.and_then(|w| self.registry.get(w)) {
            Some(client) => {
                let applied = client.size_hints.apply(screen.width, screen.height, true);
                screen.with_size(applied.width, applied.height)
            }
            None => screen,
        };

        if let Some(frame) = self.frames.get_mut(&frame_id) {
            toggle(frame, target);
        }
        self.apply_frame_geometry(frame_id);
        self.raise(frame_id);
    }

    // ---- hint refresh -----------------------------------------------

    /// React to a property change on a managed window, refreshing exactly
    /// the affected hint category.
    pub fn update_hints(&mut self, window: Window, kind: HintKind) -> Result<()> {
        if !self.registry.contains(window) {
            return Err(Error::LookupFailure(window));
        }
        let hints = self.display.query_hints(window)?;
        match kind {
            HintKind::Title => self.refresh_title(window, &hints),
            HintKind::Normal => self.refresh_size_hints(window, &hints),
            HintKind::Protocols => {
                if let Some(client) = self.registry.get_mut(window) {
                    client.update_protocols(hints.protocols);
                }
            }
            HintKind::WmHints => {
                if let Some(client) = self.registry.get_mut(window) {
                    client.update_wm_hints(hints.wm.as_ref());
                }
                transients::set_modal(&mut self.registry, window, hints.modal);
            }
            HintKind::Class => {
                if let Some(client) = self.registry.get_mut(window) {
                    client.update_class(&hints.instance_name, &hints.class_name);
                }
            }
            HintKind::TransientFor => {
                if let Some(client) = self.registry.get_mut(window) {
                    client.transient_for_hint = hints.transient_for;
                }
                transients::resolve(&mut self.registry, window);
            }
        }
        Ok(())
    }

    fn refresh_title(&mut self, window: Window, hints: &WindowHints) {
        let changed = self
            .registry
            .get_mut(window)
            .map(|c| c.update_title(&hints.title))
            .unwrap_or(false);
        if !changed {
            return;
        }
        if let (Some(frame_id), Some(client)) = (self.frame_of(window), self.registry.get(window)) {
            self.presentation
                .title_changed(frame_id, window, &client.title);
        }
    }

    fn refresh_size_hints(&mut self, window: Window, hints: &WindowHints) {
        let new_hints = crate::hints::SizeHints::from_raw(hints.normal.as_ref());
        let needs_reclamp = self
            .registry
            .get_mut(window)
            .map(|c| c.update_size_hints(new_hints))
            .unwrap_or(false);
        if !needs_reclamp {
            return;
        }
        let Some(frame_id) = self.frame_of(window) else {
            return;
        };
        // Re-clamp the frame's current size under the new constraints.
        let geometry = match self.frames.get(&frame_id) {
            Some(frame) => frame.geometry,
            None => return,
        };
        let applied = new_hints.apply(geometry.width, geometry.height, false);
        if let Some(frame) = self.frames.get_mut(&frame_id) {
            frame.geometry = geometry.with_size(applied.width, applied.height);
        }
        self.apply_frame_geometry(frame_id);
    }

    /// Pin a user-chosen title; later title hints stop affecting it.
    pub fn set_title(&mut self, window: Window, title: &str) {
        let Some(client) = self.registry.get_mut(window) else {
            return;
        };
        client.set_title_user(title);
        if let (Some(frame_id), Some(client)) = (self.frame_of(window), self.registry.get(window)) {
            self.presentation
                .title_changed(frame_id, window, &client.title);
        }
    }

    // ---- internals --------------------------------------------------

    pub(crate) fn create_frame(
        &mut self,
        window: Window,
        geometry: Geometry,
        frame_layer: i32,
    ) -> FrameId {
        let frame_id = self.next_frame;
        self.next_frame += 1;
        let frame = Frame::new(frame_id, window, geometry, frame_layer);
        self.stacking.raise(frame_id, frame.layer);
        self.frames.insert(frame_id, frame);
        frame_id
    }

    fn destroy_frame(&mut self, frame_id: FrameId) {
        debug!("destroying frame {}", frame_id);
        self.frames.remove(&frame_id);
        self.stacking.remove(frame_id);
        if self.session.as_ref().map(|s| s.frame) == Some(frame_id) {
            self.abort_moveresize();
        }
        self.presentation.frame_destroyed(frame_id);
    }

    /// Splice a tab out of the neighbor chain: its successor inherits its
    /// left neighbor.
    fn unlink_tab(&mut self, window: Window) {
        let Some(frame_id) = self.frame_of(window) else {
            return;
        };
        let successor = self
            .frames
            .get(&frame_id)
            .and_then(|f| f.successor_of(window));
        let left = self.registry.get(window).and_then(|c| c.group_left);
        if let Some(successor) = successor.and_then(|s| self.registry.get_mut(s)) {
            successor.group_left = left;
        }
    }

    pub(crate) fn show_frame(&mut self, frame_id: FrameId) {
        let clients = match self.frames.get_mut(&frame_id) {
            Some(frame) => {
                if frame.state == WmState::Withdrawn {
                    frame.state = WmState::Normal;
                }
                frame.clients.clone()
            }
            None => return,
        };
        for window in clients {
            if let Err(err) = self.display.map_window(window) {
                debug!("map of 0x{:x} failed: {}", window, err);
            }
        }
    }

    pub(crate) fn hide_frame(&mut self, frame_id: FrameId) {
        let clients = match self.frames.get(&frame_id) {
            Some(frame) => frame.clients.clone(),
            None => return,
        };
        for window in clients {
            if let Err(err) = self.display.unmap_window(window) {
                debug!("unmap of 0x{:x} failed: {}", window, err);
            }
        }
    }

    /// Push a frame's logical geometry out to every tab.
    pub(crate) fn apply_frame_geometry(&mut self, frame_id: FrameId) {
        let (geometry, clients) = match self.frames.get(&frame_id) {
            Some(frame) => (frame.geometry, frame.clients.clone()),
            None => return,
        };
        for window in clients {
            if let Err(err) = self.display.configure(window, geometry) {
                debug!("configure of 0x{:x} failed: {}", window, err);
            }
        }
    }

    /// Record the ICCCM state on each window so the clients (and any
    /// session manager) can read it back.
    fn publish_state(&mut self, clients: &[Window], state: WmState) {
        for &window in clients {
            let value = (state as u32).to_le_bytes();
            if let Err(err) = self.display.set_property(window, "WM_STATE", &value) {
                debug!("state publish on 0x{:x} failed: {}", window, err);
            }
        }
    }

    /// Frames holding transients of any of the given clients.
    fn transient_frames_of(&self, clients: &[Window]) -> Vec<FrameId> {
        let mut result = Vec::new();
        for &window in clients {
            let Some(client) = self.registry.get(window) else {
                continue;
            };
            for &child in &client.transients {
                if let Some(frame) = self.registry.get(child).and_then(|c| c.frame) {
                    if !result.contains(&frame) && self.frames.contains_key(&frame) {
                        result.push(frame);
                    }
                }
            }
        }
        result
    }
}

/// Decoration preset implied by the window type.
fn decor_preset(window_type: WindowType) -> DecorPreset {
    match window_type {
        WindowType::Dock
        | WindowType::Desktop
        | WindowType::Splash
        | WindowType::Notification => DecorPreset::None,
        WindowType::Toolbar | WindowType::Menu => DecorPreset::Tool,
        WindowType::Utility => DecorPreset::Tiny,
        WindowType::Normal | WindowType::Dialog => DecorPreset::Normal,
    }
}

/// Stacking layer implied by the window type.
fn initial_layer(window_type: WindowType) -> i32 {
    match window_type {
        WindowType::Desktop => layer::DESKTOP,
        WindowType::Dock => layer::ABOVE,
        WindowType::Menu | WindowType::Notification => layer::MENU,
        _ => layer::NORMAL,
    }
}
