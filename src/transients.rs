//! Transients Module
//!
//! Resolution of the "dialog owns its parent" relationship. The relation
//! must stay a forest: clients can declare arbitrary, possibly stale or
//! adversarial transient targets, so every relink runs an upward cycle
//! check and breaks any loop by clearing the offending edge.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::Error;
use crate::registry::ClientRegistry;
use crate::Window;

/// Resolve (or re-resolve) a client's transient edge from its declared
/// hint. Always starts from scratch: the current link and any wait-list
/// membership are dropped first.
pub fn resolve(registry: &mut ClientRegistry, window: Window) {
    unlink(registry, window);
    registry.remove_from_wait_lists(window);

    let Some(client) = registry.get(window) else {
        return;
    };
    let modal = client.modal;
    let Some(target) = client.transient_for_hint else {
        return;
    };

    // Zero, the root/desktop, or the window itself: not a transient.
    if target == 0 || target == registry.root() || target == window {
        debug!("0x{:x}: transient-for hint 0x{:x} ignored", window, target);
        return;
    }

    if !registry.contains(target) {
        // Park until the declared parent shows up.
        debug!("0x{:x} waiting for transient parent 0x{:x}", window, target);
        registry
            .transient_wait
            .entry(target)
            .or_default()
            .push(window);
        return;
    }

    if let Some(client) = registry.get_mut(window) {
        client.transient_for = Some(target);
    }

    break_cycles(registry, window);

    // Complete the link only if the cycle check left the edge standing.
    if registry.get(window).and_then(|c| c.transient_for) == Some(target) {
        debug!("0x{:x} is transient for 0x{:x}", window, target);
        if let Some(parent) = registry.get_mut(target) {
            parent.transients.push(window);
            if modal {
                parent.add_modal();
            }
        }
    }
}

/// Detach a client from its current transient parent, fixing up the
/// parent's child list and modal count. The declared hint is untouched.
fn unlink(registry: &mut ClientRegistry, window: Window) {
    let Some(client) = registry.get(window) else {
        return;
    };
    let modal = client.modal;
    let Some(parent) = client.transient_for else {
        return;
    };

    if let Some(parent) = registry.get_mut(parent) {
        parent.transients.retain(|&w| w != window);
        if modal {
            parent.remove_modal();
        }
    }
    if let Some(client) = registry.get_mut(window) {
        client.transient_for = None;
    }
}

/// Walk the chain upward from `start`; any ancestor whose parent edge
/// points back at `start` has that edge cleared. A visited set bounds the
/// walk even on graphs that were already malformed.
fn break_cycles(registry: &mut ClientRegistry, start: Window) {
    let mut visited = HashSet::new();
    let mut current = start;
    loop {
        if !visited.insert(current) {
            warn!("{}", Error::CycleDetected(current));
            unlink(registry, current);
            return;
        }
        let Some(parent) = registry.get(current).and_then(|c| c.transient_for) else {
            return;
        };
        if parent == start {
            warn!("{}", Error::CycleDetected(start));
            unlink(registry, current);
            return;
        }
        current = parent;
    }
}

/// Topmost ancestor of a transient chain; the client itself when it has
/// no parent. Bounded even if the forest invariant were violated.
pub fn root_transient_for(registry: &ClientRegistry, window: Window) -> Window {
    let mut visited = HashSet::new();
    let mut current = window;
    while let Some(parent) = registry.get(current).and_then(|c| c.transient_for) {
        if !visited.insert(current) {
            break;
        }
        current = parent;
    }
    current
}

/// Flip a client's modal flag, keeping the parent's modal-descendant
/// count in step.
pub fn set_modal(registry: &mut ClientRegistry, window: Window, modal: bool) {
    let Some(client) = registry.get_mut(window) else {
        return;
    };
    if client.modal == modal {
        return;
    }
    client.modal = modal;
    let parent = client.transient_for;

    if let Some(parent) = parent.and_then(|p| registry.get_mut(p)) {
        if modal {
            parent.add_modal();
        } else {
            parent.remove_modal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::display::WindowHints;

    const ROOT: Window = 1;

    fn client(window: Window, transient_for: Option<Window>) -> Client {
        let hints = WindowHints {
            transient_for,
            ..WindowHints::default()
        };
        Client::new(window, &hints)
    }

    fn assert_acyclic(registry: &ClientRegistry) {
        for start in registry.windows() {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = registry.get(current).and_then(|c| c.transient_for) {
                assert_ne!(parent, start, "chain returned to 0x{start:x}");
                current = parent;
                steps += 1;
                assert!(steps <= registry.len(), "unbounded chain from 0x{start:x}");
            }
        }
    }

    #[test]
    fn self_and_root_targets_are_ignored() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, Some(0xa)));
        registry.register(client(0xb, Some(ROOT)));
        registry.register(client(0xc, Some(0)));
        for w in [0xa, 0xb, 0xc] {
            assert!(registry.get(w).unwrap().transient_for.is_none());
            assert!(registry.waiters(w).is_empty());
        }
    }

    #[test]
    fn mutual_declaration_is_broken_into_a_forest() {
        let mut registry = ClientRegistry::new(ROOT);
        // A declares B before B exists; B then declares A.
        registry.register(client(0xa, Some(0xb)));
        registry.register(client(0xb, Some(0xa)));

        assert_acyclic(&registry);
        // Exactly one of the two edges survives.
        let ab = registry.get(0xa).unwrap().transient_for;
        let ba = registry.get(0xb).unwrap().transient_for;
        assert!(ab.is_some() != ba.is_some());
    }

    #[test]
    fn relink_into_own_descendant_is_repaired() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        registry.register(client(0xb, Some(0xa)));
        registry.register(client(0xc, Some(0xb)));

        // A now claims to be transient for its grandchild C.
        registry.get_mut(0xa).unwrap().transient_for_hint = Some(0xc);
        resolve(&mut registry, 0xa);

        assert_acyclic(&registry);
    }

    #[test]
    fn acyclic_after_relink_storm() {
        let mut registry = ClientRegistry::new(ROOT);
        let windows: Vec<Window> = (0x10..0x18).collect();
        for &w in &windows {
            registry.register(client(w, None));
        }
        // Deterministic churn of declared targets, including stale and
        // self-referential ones.
        for round in 0..6u64 {
            for (i, &w) in windows.iter().enumerate() {
                let target = windows[((i as u64 + round * 3 + 1) % 8) as usize];
                registry.get_mut(w).unwrap().transient_for_hint = Some(target);
                resolve(&mut registry, w);
                assert_acyclic(&registry);
            }
        }
    }

    #[test]
    fn transient_list_stays_in_sync_with_edges() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        registry.register(client(0xb, Some(0xa)));

        // Re-declare B against a fresh parent; A must forget it.
        registry.register(client(0xc, None));
        registry.get_mut(0xb).unwrap().transient_for_hint = Some(0xc);
        resolve(&mut registry, 0xb);

        assert!(registry.get(0xa).unwrap().transients.is_empty());
        assert_eq!(registry.get(0xc).unwrap().transients, vec![0xb]);
    }

    #[test]
    fn root_of_chain() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        registry.register(client(0xb, Some(0xa)));
        registry.register(client(0xc, Some(0xb)));

        assert_eq!(root_transient_for(&registry, 0xc), 0xa);
        assert_eq!(root_transient_for(&registry, 0xa), 0xa);
    }

    #[test]
    fn modal_toggle_tracks_parent_count() {
        let mut registry = ClientRegistry::new(ROOT);
        registry.register(client(0xa, None));
        registry.register(client(0xb, Some(0xa)));

        set_modal(&mut registry, 0xb, true);
        assert_eq!(registry.get(0xa).unwrap().modal_count, 1);
        set_modal(&mut registry, 0xb, true); // no double count
        assert_eq!(registry.get(0xa).unwrap().modal_count, 1);
        set_modal(&mut registry, 0xb, false);
        assert_eq!(registry.get(0xa).unwrap().modal_count, 0);
    }
}
