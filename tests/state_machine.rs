mod common;

use common::{Call, MockDisplay};
use tabwm::{
    DisplayEvent, FrameId, Geometry, ProtocolKind, Settings, Window, WindowHints, WindowManager,
    WmProtocols, WmState,
};

fn setup() -> WindowManager<MockDisplay> {
    common::init_logging();
    WindowManager::new(MockDisplay::new(), Settings::default())
}

fn manage(
    manager: &mut WindowManager<MockDisplay>,
    window: Window,
    hints: WindowHints,
) -> FrameId {
    manager
        .display()
        .add_window(window, hints, Geometry::new(0, 0, 300, 200));
    manager.manage_window(window).expect("manage")
}

fn wm_state_of(manager: &WindowManager<MockDisplay>, window: Window) -> Option<u32> {
    manager
        .display()
        .property(window, "WM_STATE")
        .map(|v| u32::from_le_bytes([v[0], v[1], v[2], v[3]]))
}

#[test]
fn iconify_descends_the_transient_chain() {
    let mut manager = setup();
    let parent_frame = manage(&mut manager, 0xa, WindowHints::default());
    let dialog_frame = manage(
        &mut manager,
        0xb,
        WindowHints {
            transient_for: Some(0xa),
            ..WindowHints::default()
        },
    );

    manager.iconify(parent_frame);
    assert_eq!(manager.frame(parent_frame).unwrap().state, WmState::Iconic);
    assert_eq!(manager.frame(dialog_frame).unwrap().state, WmState::Iconic);
    assert_eq!(wm_state_of(&manager, 0xa), Some(3));
    assert_eq!(wm_state_of(&manager, 0xb), Some(3));
}

#[test]
fn restoring_a_dialog_drags_its_parent_back() {
    let mut manager = setup();
    let parent_frame = manage(&mut manager, 0xa, WindowHints::default());
    let dialog_frame = manage(
        &mut manager,
        0xb,
        WindowHints {
            transient_for: Some(0xa),
            ..WindowHints::default()
        },
    );
    manager.iconify(parent_frame);

    manager.deiconify(dialog_frame);
    assert_eq!(manager.frame(dialog_frame).unwrap().state, WmState::Normal);
    assert_eq!(manager.frame(parent_frame).unwrap().state, WmState::Normal);
}

#[test]
fn self_unmap_withdraws_and_remap_restores() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa, WindowHints::default());

    manager.handle_event(DisplayEvent::UnmapNotify { window: 0xa });
    assert_eq!(manager.frame(frame).unwrap().state, WmState::Withdrawn);
    assert_eq!(wm_state_of(&manager, 0xa), Some(0));

    manager.handle_event(DisplayEvent::MapRequest { window: 0xa });
    assert_eq!(manager.frame(frame).unwrap().state, WmState::Normal);
}

#[test]
fn unmap_of_an_iconic_frame_is_not_a_withdrawal() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa, WindowHints::default());
    manager.iconify(frame);

    manager.handle_event(DisplayEvent::UnmapNotify { window: 0xa });
    assert_eq!(manager.frame(frame).unwrap().state, WmState::Iconic);

    // A map request on an iconic frame restores it.
    manager.handle_event(DisplayEvent::MapRequest { window: 0xa });
    assert_eq!(manager.frame(frame).unwrap().state, WmState::Normal);
}

#[test]
fn shade_reports_iconic_without_iconifying() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa, WindowHints::default());
    manager.display().clear_calls();

    manager.shade(frame);
    let shaded = manager.frame(frame).unwrap();
    assert!(shaded.shaded);
    assert_eq!(shaded.state, WmState::Normal);
    assert_eq!(wm_state_of(&manager, 0xa), Some(3));
    assert!(!manager
        .display()
        .calls()
        .contains(&Call::Unmap(0xa)));

    manager.shade(frame);
    assert!(!manager.frame(frame).unwrap().shaded);
    assert_eq!(wm_state_of(&manager, 0xa), Some(1));
}

#[test]
fn close_prefers_delete_protocol_when_announced() {
    let mut manager = setup();
    manage(
        &mut manager,
        0xa,
        WindowHints {
            protocols: WmProtocols::DELETE,
            ..WindowHints::default()
        },
    );
    manage(&mut manager, 0xb, WindowHints::default());
    manager.display().clear_calls();

    manager.close_client(0xa, false).expect("close");
    manager.close_client(0xb, false).expect("close");
    let calls = manager.display().calls();
    assert!(calls.contains(&Call::Protocol(0xa, ProtocolKind::Delete)));
    assert!(calls.contains(&Call::Kill(0xb)));

    // Forceful close skips the protocol even when announced.
    manager.close_client(0xa, true).expect("close");
    assert!(manager.display().calls().contains(&Call::Kill(0xa)));
}

#[test]
fn sticky_frame_survives_workspace_switches() {
    let mut manager = setup();
    let stuck_frame = manage(&mut manager, 0xa, WindowHints::default());
    let plain_frame = manage(&mut manager, 0xb, WindowHints::default());
    manager.stick(stuck_frame);
    manager.display().clear_calls();

    manager.switch_workspace(1);
    let calls = manager.display().calls();
    assert!(calls.contains(&Call::Unmap(0xb)));
    assert!(calls.contains(&Call::Map(0xa)));
    assert_eq!(manager.frame(plain_frame).unwrap().workspace, 0);
    assert_eq!(manager.current_workspace(), 1);
}

#[test]
fn moving_a_frame_to_another_workspace_hides_it() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa, WindowHints::default());
    manager.display().clear_calls();

    manager.set_workspace(frame, 2);
    assert_eq!(manager.frame(frame).unwrap().workspace, 2);
    assert!(manager.display().calls().contains(&Call::Unmap(0xa)));

    manager.switch_workspace(2);
    assert!(manager.display().calls().contains(&Call::Map(0xa)));
}

#[test]
fn iconic_frame_stays_hidden_across_workspace_moves() {
    let mut manager = setup();
    let frame = manage(&mut manager, 0xa, WindowHints::default());
    manager.iconify(frame);
    manager.display().clear_calls();

    // Away and back onto the current workspace: still iconic, so still
    // unmapped.
    manager.set_workspace(frame, 1);
    manager.set_workspace(frame, 0);

    assert_eq!(manager.frame(frame).unwrap().state, WmState::Iconic);
    assert!(!manager.display().calls().contains(&Call::Map(0xa)));

    manager.deiconify(frame);
    assert!(manager.display().calls().contains(&Call::Map(0xa)));
}
