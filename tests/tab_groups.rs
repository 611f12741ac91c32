mod common;

use common::MockDisplay;
use tabwm::{FrameId, Geometry, Settings, Window, WindowHints, WindowManager};

fn setup() -> WindowManager<MockDisplay> {
    common::init_logging();
    WindowManager::new(MockDisplay::new(), Settings::default())
}

fn manage(manager: &mut WindowManager<MockDisplay>, window: Window) -> FrameId {
    manager
        .display()
        .add_window(window, WindowHints::default(), Geometry::new(0, 0, 300, 200));
    manager.manage_window(window).expect("manage")
}

/// One frame holding 0xa, 0xb, 0xc in that order.
fn three_tab_frame(manager: &mut WindowManager<MockDisplay>) -> FrameId {
    let frame = manage(manager, 0xa);
    manage(manager, 0xb);
    manage(manager, 0xc);
    manager.attach(frame, 0xb).expect("attach b");
    manager.attach(frame, 0xc).expect("attach c");
    frame
}

#[test]
fn attach_merges_and_destroys_the_donor() {
    let mut manager = setup();
    let target = manage(&mut manager, 0xa);
    let donor = manage(&mut manager, 0xb);

    manager.attach(target, 0xb).expect("attach");

    assert_eq!(manager.frame(target).unwrap().clients, vec![0xa, 0xb]);
    assert_eq!(manager.frame_of(0xb), Some(target));
    assert!(manager.frame(donor).is_none());
    // The migrated tab's left neighbor is the target's old tail.
    assert_eq!(manager.registry.get(0xb).unwrap().group_left, Some(0xa));
}

#[test]
fn attach_splices_a_whole_group_preserving_neighbors() {
    let mut manager = setup();
    let target = manage(&mut manager, 0xa);
    let donor = manage(&mut manager, 0xb);
    manage(&mut manager, 0xc);
    manager.attach(donor, 0xc).expect("attach c to donor");

    manager.attach(target, 0xb).expect("merge groups");

    assert_eq!(manager.frame(target).unwrap().clients, vec![0xa, 0xb, 0xc]);
    assert_eq!(manager.registry.get(0xb).unwrap().group_left, Some(0xa));
    // 0xc keeps its old neighbor across the merge.
    assert_eq!(manager.registry.get(0xc).unwrap().group_left, Some(0xb));
}

#[test]
fn attached_client_becomes_the_active_tab() {
    let mut manager = setup();
    let target = manage(&mut manager, 0xa);
    let donor = manage(&mut manager, 0xb);
    manage(&mut manager, 0xc);
    manager.attach(donor, 0xc).expect("attach c to donor");
    // The donor's active tab is 0xb, but the merge names 0xc.
    manager.set_current_client(0xb);

    manager.attach(target, 0xc).expect("merge groups");

    let frame = manager.frame(target).unwrap();
    assert_eq!(frame.clients, vec![0xa, 0xb, 0xc]);
    assert_eq!(frame.active, Some(0xc));
    assert_eq!(manager.display().last_focus(), Some(0xc));
}

#[test]
fn detaching_a_non_active_tab_keeps_order_and_active() {
    let mut manager = setup();
    let frame = three_tab_frame(&mut manager);
    manager.set_current_client(0xb);
    assert_eq!(manager.frame(frame).unwrap().active, Some(0xb));

    let new_frame = manager.detach(0xc).expect("detach");

    let old = manager.frame(frame).unwrap();
    assert_eq!(old.clients, vec![0xa, 0xb]);
    assert_eq!(old.active, Some(0xb));

    let fresh = manager.frame(new_frame).unwrap();
    assert_eq!(fresh.clients, vec![0xc]);
    assert_eq!(fresh.active, Some(0xc));
    assert!(manager.registry.get(0xc).unwrap().group_left.is_none());
}

#[test]
fn detaching_the_active_tab_moves_the_pointer_forward() {
    let mut manager = setup();
    let frame = three_tab_frame(&mut manager);
    manager.set_current_client(0xb);

    manager.detach(0xb).expect("detach");

    let old = manager.frame(frame).unwrap();
    assert_eq!(old.clients, vec![0xa, 0xc]);
    assert_eq!(old.active, Some(0xc));
    // 0xc inherits 0xb's left neighbor.
    assert_eq!(manager.registry.get(0xc).unwrap().group_left, Some(0xa));
}

#[test]
fn sole_tab_cannot_detach() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa);
    assert_eq!(manager.detach(0xa).expect("detach"), frame);
    assert_eq!(manager.frame(frame).unwrap().clients, vec![0xa]);
}

#[test]
fn closing_a_frame_asks_every_tab() {
    let mut manager = setup();
    let frame = three_tab_frame(&mut manager);
    manager.display().clear_calls();

    manager.close_frame(frame, false);

    // No delete protocol announced, so each tab is killed.
    use common::Call;
    let kills: Vec<_> = manager
        .display()
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Kill(_)))
        .collect();
    assert_eq!(
        kills,
        vec![Call::Kill(0xa), Call::Kill(0xb), Call::Kill(0xc)]
    );
}
