//! Scripted display server used by the integration tests: windows and
//! their hints are seeded up front, every request is recorded, and
//! windows can be made to vanish mid-operation.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use tabwm::{
    DisplayServer, Error, Geometry, ProtocolKind, Result, Window, WindowHints,
};

pub const ROOT: Window = 1;

/// Surface the model's tracing output in test runs:
/// `RUST_LOG=debug cargo test -- --nocapture`
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Map(Window),
    Unmap(Window),
    Configure(Window, Geometry),
    Focus(Window),
    Protocol(Window, ProtocolKind),
    Kill(Window),
    Raise(Window),
    Lower(Window),
    RestackAbove(Window, Window),
    Grab(Window),
    Ungrab,
}

#[derive(Default)]
pub struct MockDisplay {
    hints: RefCell<HashMap<Window, WindowHints>>,
    geometries: RefCell<HashMap<Window, Geometry>>,
    vanished: RefCell<HashSet<Window>>,
    properties: RefCell<HashMap<(Window, String), Vec<u8>>>,
    calls: RefCell<Vec<Call>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        let display = Self::default();
        display
            .geometries
            .borrow_mut()
            .insert(ROOT, Geometry::new(0, 0, 1920, 1080));
        display
    }

    pub fn add_window(&self, window: Window, hints: WindowHints, geometry: Geometry) {
        self.hints.borrow_mut().insert(window, hints);
        self.geometries.borrow_mut().insert(window, geometry);
    }

    pub fn vanish(&self, window: Window) {
        self.vanished.borrow_mut().insert(window);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn property(&self, window: Window, key: &str) -> Option<Vec<u8>> {
        self.properties
            .borrow()
            .get(&(window, key.to_string()))
            .cloned()
    }

    pub fn last_focus(&self) -> Option<Window> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            Call::Focus(w) => Some(*w),
            _ => None,
        })
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check_alive(&self, window: Window) -> Result<()> {
        if self.vanished.borrow().contains(&window) {
            return Err(Error::StaleReference(window));
        }
        Ok(())
    }
}

impl DisplayServer for MockDisplay {
    fn root(&self) -> Window {
        ROOT
    }

    fn query_geometry(&self, window: Window) -> Result<Geometry> {
        self.check_alive(window)?;
        Ok(self
            .geometries
            .borrow()
            .get(&window)
            .copied()
            .unwrap_or(Geometry::new(0, 0, 100, 100)))
    }

    fn query_hints(&self, window: Window) -> Result<WindowHints> {
        self.check_alive(window)?;
        Ok(self
            .hints
            .borrow()
            .get(&window)
            .cloned()
            .unwrap_or_default())
    }

    fn get_property(&self, window: Window, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_alive(window)?;
        Ok(self.property(window, key))
    }

    fn set_property(&self, window: Window, key: &str, data: &[u8]) -> Result<()> {
        self.check_alive(window)?;
        self.properties
            .borrow_mut()
            .insert((window, key.to_string()), data.to_vec());
        Ok(())
    }

    fn send_protocol_message(&self, window: Window, kind: ProtocolKind) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Protocol(window, kind));
        Ok(())
    }

    fn set_input_focus(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Focus(window));
        Ok(())
    }

    fn grab_pointer(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Grab(window));
        Ok(())
    }

    fn ungrab_pointer(&self) -> Result<()> {
        self.record(Call::Ungrab);
        Ok(())
    }

    fn map_window(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Map(window));
        Ok(())
    }

    fn unmap_window(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Unmap(window));
        Ok(())
    }

    fn reparent(&self, window: Window, _new_parent: Window, _x: i32, _y: i32) -> Result<()> {
        self.check_alive(window)
    }

    fn configure(&self, window: Window, geometry: Geometry) -> Result<()> {
        self.check_alive(window)?;
        self.geometries.borrow_mut().insert(window, geometry);
        self.record(Call::Configure(window, geometry));
        Ok(())
    }

    fn raise_in_stack(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Raise(window));
        Ok(())
    }

    fn lower_in_stack(&self, window: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::Lower(window));
        Ok(())
    }

    fn restack_above(&self, window: Window, sibling: Window) -> Result<()> {
        self.check_alive(window)?;
        self.record(Call::RestackAbove(window, sibling));
        Ok(())
    }

    fn change_border_width(&self, window: Window, _px: u32) -> Result<()> {
        self.check_alive(window)
    }

    fn kill_client(&self, window: Window) -> Result<()> {
        self.record(Call::Kill(window));
        Ok(())
    }

    fn window_exists(&self, window: Window) -> bool {
        !self.vanished.borrow().contains(&window)
    }
}
