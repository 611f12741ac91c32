//! Registry Module
//!
//! Process-wide handle-to-client map plus the transient wait-list: clients
//! that declared themselves transient for a window nobody has registered
//! yet, keyed by the handle they are waiting for.

use std::collections::HashMap;

use tracing::debug;

use crate::client::Client;
use crate::transients;
use crate::Window;

pub struct ClientRegistry {
    root: Window,
    pub(crate) clients: HashMap<Window, Client>,
    pub(crate) transient_wait: HashMap<Window, Vec<Window>>,
}

impl ClientRegistry {
    pub fn new(root: Window) -> Self {
        Self {
            root,
            clients: HashMap::new(),
            transient_wait: HashMap::new(),
        }
    }

    /// Root/desktop handle; a transient-for hint naming it means "not
    /// transient".
    pub fn root(&self) -> Window {
        self.root
    }

    pub fn get(&self, window: Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn get_mut(&mut self, window: Window) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn contains(&self, window: Window) -> bool {
        self.clients.contains_key(&window)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn windows(&self) -> impl Iterator<Item = Window> + '_ {
        self.clients.keys().copied()
    }

    /// Register a new client: resolve everyone who was waiting for this
    /// handle, then resolve the new client's own transient edge.
    pub fn register(&mut self, client: Client) {
        let window = client.window;
        debug!("registering client 0x{:x}", window);
        self.clients.insert(window, client);

        if let Some(waiters) = self.transient_wait.remove(&window) {
            debug!(
                "0x{:x} arrived; resolving {} waiting transient(s)",
                window,
                waiters.len()
            );
            for waiter in waiters {
                transients::resolve(self, waiter);
            }
        }

        transients::resolve(self, window);
    }

    /// Destruction lifecycle: unlink from the transient parent, orphan own
    /// transients (their edge is cleared, never reassigned), and purge
    /// every wait-list entry this client created or is named by.
    pub fn unregister(&mut self, window: Window) -> Option<Client> {
        let client = self.clients.remove(&window)?;
        debug!("unregistering client 0x{:x}", window);

        if let Some(parent) = client.transient_for {
            if let Some(parent) = self.clients.get_mut(&parent) {
                parent.transients.retain(|&w| w != window);
                if client.modal {
                    parent.remove_modal();
                }
            }
        }

        for &child in &client.transients {
            if let Some(child) = self.clients.get_mut(&child) {
                child.transient_for = None;
            }
        }

        // Transients can die before their declared parent ever exists.
        self.remove_from_wait_lists(window);
        self.transient_wait.remove(&window);

        Some(client)
    }

    /// Drop a client from every wait list it occupies (it may have changed
    /// its declared target while still waiting for an older one).
    pub(crate) fn remove_from_wait_lists(&mut self, window: Window) {
        self.transient_wait.retain(|_, waiters| {
            waiters.retain(|&w| w != window);
            !waiters.is_empty()
        });
    }

    /// Clients currently waiting for `target` to appear.
    pub fn waiters(&self, target: Window) -> &[Window] {
        self.transient_wait
            .get(&target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::WindowHints;

    const ROOT: Window = 1;

    fn client(window: Window, transient_for: Option<Window>) -> Client {
        let hints = WindowHints {
            transient_for,
            ..WindowHints::default()
        };
        Client::new(window, &hints)
    }

    #[test]
    fn transient_waits_until_parent_registers() {
        let mut registry = ClientRegistry::new(ROOT);

        // B declares transient-for A before A exists.
        registry.register(client(0xb, Some(0xa)));
        assert_eq!(registry.waiters(0xa), &[0xb]);
        assert!(registry.get(0xb).unwrap().transient_for.is_none());

        registry.register(client(0xa, None));
        assert!(registry.waiters(0xa).is_empty());
        assert_eq!(registry.get(0xb).unwrap().transient_for, Some(0xa));
        assert_eq!(registry.get(0xa).unwrap().transients, vec![0xb]);
    }

    #[test]
    fn changed_target_moves_wait_list_entry() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xb, Some(0xa)));
        assert_eq!(registry.waiters(0xa), &[0xb]);

        // B re-declares against a different, still-unknown target.
        registry.get_mut(0xb).unwrap().transient_for_hint = Some(0xc);
        transients::resolve(&mut registry, 0xb);
        assert!(registry.waiters(0xa).is_empty());
        assert_eq!(registry.waiters(0xc), &[0xb]);

        // The old target arriving later links nothing.
        registry.register(client(0xa, None));
        assert!(registry.get(0xb).unwrap().transient_for.is_none());
    }

    #[test]
    fn destroying_parent_orphans_transients_without_destroying_them() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        registry.register(client(0xb, Some(0xa)));
        registry.register(client(0xc, Some(0xa)));
        assert_eq!(registry.get(0xa).unwrap().transients, vec![0xb, 0xc]);

        registry.unregister(0xa);
        assert!(registry.contains(0xb) && registry.contains(0xc));
        assert!(registry.get(0xb).unwrap().transient_for.is_none());
        assert!(registry.get(0xc).unwrap().transient_for.is_none());
    }

    #[test]
    fn destroying_waiter_purges_wait_list() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xb, Some(0xa)));
        registry.unregister(0xb);
        assert!(registry.waiters(0xa).is_empty());

        // A arriving later must not resurrect the dead waiter.
        registry.register(client(0xa, None));
        assert!(registry.get(0xa).unwrap().transients.is_empty());
    }

    #[test]
    fn modal_transient_bumps_parent_count() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        let mut modal = client(0xb, Some(0xa));
        modal.modal = true;
        registry.register(modal);

        assert_eq!(registry.get(0xa).unwrap().modal_count, 1);
        assert!(registry.get(0xa).unwrap().is_modal());

        registry.unregister(0xb);
        assert_eq!(registry.get(0xa).unwrap().modal_count, 0);
    }
}
