//! Routing of native messages to event targets

mod common;

use std::rc::Rc;

use common::*;
use embedding_window::prelude::*;

/// Attached window with its initial paint already delivered
fn settled_window(manager: &Rc<Manager>, target: &Rc<RecordingTarget>) -> WindowHandle {
    let (_host, window) = attached_window(manager, target);
    manager.backend().pump();
    assert_eq!(target.calls(), vec![Call::Paint]);
    window
}

#[test]
fn test_repeated_position_is_forwarded_once() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);
    manager.set_motion_events(window, true).unwrap();

    manager.backend().send_pointer_move(window, 5, 5).unwrap();
    manager.backend().send_pointer_move(window, 5, 5).unwrap();
    manager.backend().pump();
    assert_eq!(target.calls(), vec![Call::Paint, Call::Move(5, 5)]);

    manager.backend().send_pointer_move(window, 6, 5).unwrap();
    manager.backend().send_pointer_move(window, 5, 5).unwrap();
    manager.backend().pump();
    assert_eq!(
        target.calls(),
        vec![Call::Paint, Call::Move(5, 5), Call::Move(6, 5), Call::Move(5, 5)]
    );
    assert_eq!(manager.stats().suppressed, 1);
}

#[test]
fn test_motion_disabled_suppresses_moves() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);

    manager.backend().send_pointer_move(window, 1, 2).unwrap();
    manager.backend().send_pointer_move(window, 3, 4).unwrap();
    manager.backend().pump();

    assert_eq!(target.calls(), vec![Call::Paint]);
    assert_eq!(manager.stats().suppressed, 2);
    // Suppressed moves are still consumed
    assert!(manager.backend().defaulted_messages().is_empty());

    // Turning motion off again stops forwarding
    manager.set_motion_events(window, true).unwrap();
    manager.backend().send_pointer_move(window, 8, 8).unwrap();
    manager.backend().pump();
    manager.set_motion_events(window, false).unwrap();
    manager.backend().send_pointer_move(window, 9, 9).unwrap();
    manager.backend().pump();
    assert_eq!(target.calls(), vec![Call::Paint, Call::Move(8, 8)]);
}

#[test]
fn test_suppressed_moves_do_not_update_last_position() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);

    manager.backend().send_pointer_move(window, 4, 4).unwrap();
    manager.backend().pump();
    manager.set_motion_events(window, true).unwrap();
    manager.backend().send_pointer_move(window, 4, 4).unwrap();
    manager.backend().pump();

    assert_eq!(target.calls(), vec![Call::Paint, Call::Move(4, 4)]);
}

#[test]
fn test_paint_and_double_click_are_forwarded() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);

    manager.backend().send_double_click(window, 12, 34).unwrap();
    manager.backend().invalidate(window).unwrap();
    manager.backend().pump();

    assert_eq!(
        target.calls(),
        vec![Call::Paint, Call::DoubleClick(12, 34), Call::Paint]
    );
    assert!(manager.backend().defaulted_messages().is_empty());
}

#[test]
fn test_map_and_unmap_pointer_repeat_is_suppressed() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);
    manager.set_motion_events(window, true).unwrap();

    manager.backend().send_pointer_move(window, 7, 9).unwrap();
    manager.backend().pump();

    let host = manager.backend().surface(window).unwrap().parent.unwrap();
    manager.detach(window).unwrap();
    manager.attach(window, host, WindowRect::new(0, 0, 640, 360)).unwrap();
    manager.backend().pump();

    assert_eq!(target.calls(), vec![Call::Paint, Call::Move(7, 9), Call::Paint]);
    assert_eq!(manager.stats().suppressed, 2);
}

#[test]
fn test_unknown_windows_get_default_handling() {
    let manager = manager();
    let target = RecordingTarget::new();
    let (host, window) = attached_window(&manager, &target);
    manager.backend().pump();

    manager.backend().send_double_click(host, 1, 1).unwrap();
    manager.backend().send_pointer_move(host, 2, 2).unwrap();
    manager.backend().send_message(window, 0x0100).unwrap();
    manager.backend().pump();

    assert_eq!(
        manager.backend().defaulted_messages(),
        vec![
            (host, NativeMessage::DoubleClick { x: 1, y: 1 }),
            (host, NativeMessage::PointerMove { x: 2, y: 2 }),
            (window, NativeMessage::Other { code: 0x0100 }),
        ]
    );
    assert_eq!(target.calls(), vec![Call::Paint]);

    // A destroyed window's handle is unknown to the router as well
    manager.destroy(window).unwrap();
    assert_eq!(manager.route(window, NativeMessage::Paint), MessageDisposition::Default);
    assert_eq!(
        manager.route(window, NativeMessage::PointerMove { x: 0, y: 0 }),
        MessageDisposition::Default
    );
}

#[test]
fn test_failing_handler_does_not_block_later_events() {
    let manager = manager();
    let failing = RecordingTarget::new();
    let healthy = RecordingTarget::new();
    let first = settled_window(&manager, &failing);
    let second = settled_window(&manager, &healthy);

    failing.misbehave(Some(Misbehave::Error));
    manager.backend().send_double_click(first, 1, 1).unwrap();
    manager.backend().send_double_click(first, 2, 2).unwrap();
    manager.backend().send_double_click(second, 3, 3).unwrap();
    manager.backend().pump();

    assert_eq!(
        failing.calls(),
        vec![Call::Paint, Call::DoubleClick(1, 1), Call::DoubleClick(2, 2)]
    );
    assert_eq!(healthy.calls(), vec![Call::Paint, Call::DoubleClick(3, 3)]);
    assert_eq!(
        manager.stats(),
        DispatchStats {
            forwarded: 3,
            suppressed: 0,
            failed: 2
        }
    );
    // Failed events still count as handled
    assert!(manager.backend().defaulted_messages().is_empty());
}

#[test]
fn test_panicking_handler_is_contained() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);
    manager.set_motion_events(window, true).unwrap();

    target.misbehave(Some(Misbehave::Panic));
    manager.backend().send_pointer_move(window, 1, 1).unwrap();
    manager.backend().invalidate(window).unwrap();
    manager.backend().pump();

    target.misbehave(None);
    manager.backend().send_pointer_move(window, 2, 2).unwrap();
    manager.backend().invalidate(window).unwrap();
    manager.backend().pump();

    assert_eq!(
        target.calls(),
        vec![Call::Paint, Call::Move(1, 1), Call::Paint, Call::Move(2, 2), Call::Paint]
    );
    assert_eq!(manager.stats().failed, 2);
    assert_eq!(manager.stats().forwarded, 3);

    // The panicking paint did not leave the window marked as painting
    assert!(manager.paint_black(window).is_ok());
    assert!(manager.backend().surface(window).unwrap().black_fills.is_empty());
}

#[test]
fn test_unpainted_region_is_not_redelivered() {
    let manager = manager();
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);
    assert_eq!(manager.backend().surface(window).unwrap().invalid, None);

    target.misbehave(Some(Misbehave::Error));
    manager.backend().invalidate(window).unwrap();
    assert_eq!(manager.backend().pump(), 1);

    assert_eq!(target.calls(), vec![Call::Paint, Call::Paint]);
    assert_eq!(manager.stats().failed, 1);
    assert_eq!(manager.backend().surface(window).unwrap().invalid, None);
}

#[test]
fn test_host_context_wraps_every_handler_call() {
    let context = CountingContext::default();
    let manager = manager_with_context(&context);
    let target = RecordingTarget::new();
    let window = settled_window(&manager, &target);
    assert_eq!((context.entries.get(), context.depth.get()), (1, 0));

    target.misbehave(Some(Misbehave::Error));
    manager.backend().send_double_click(window, 1, 1).unwrap();
    manager.backend().pump();
    assert_eq!((context.entries.get(), context.depth.get()), (2, 0));

    target.misbehave(Some(Misbehave::Panic));
    manager.backend().send_double_click(window, 1, 1).unwrap();
    manager.backend().pump();
    assert_eq!((context.entries.get(), context.depth.get()), (3, 0));

    // Suppressed moves never reach the host
    manager.backend().send_pointer_move(window, 5, 5).unwrap();
    manager.backend().pump();
    assert_eq!((context.entries.get(), context.depth.get()), (3, 0));
}

#[test]
fn test_host_context_is_held_during_handler() {
    let context = CountingContext::default();
    let manager = manager_with_context(&context);
    let target = RecordingTarget::new();
    let (_host, _window) = attached_window(&manager, &target);

    let depth = Rc::clone(&context.depth);
    let observed = Rc::new(std::cell::Cell::new(0));
    let seen = Rc::clone(&observed);
    target.on_paint_run(move || seen.set(depth.get()));
    manager.backend().pump();

    assert_eq!(observed.get(), 1);
    assert_eq!(context.depth.get(), 0);
}

#[test]
fn test_paint_black_fills_invalid_region_during_paint() {
    let manager = manager();
    let target = RecordingTarget::new();
    let (_host, window) = attached_window(&manager, &target);

    let weak = Rc::downgrade(&manager);
    target.on_paint_run(move || {
        if let Some(manager) = weak.upgrade() {
            manager.paint_black(window).unwrap();
        }
    });
    manager.backend().pump();

    let surface = manager.backend().surface(window).unwrap();
    assert_eq!(surface.black_fills, vec![WindowRect::new(0, 0, 640, 360)]);
    assert_eq!(surface.invalid, None);
    assert_eq!(manager.stats().forwarded, 1);
}

#[test]
fn test_paint_black_outside_paint_is_a_no_op() {
    let manager = manager();
    let target = RecordingTarget::new();
    let (_host, window) = attached_window(&manager, &target);

    // A paint is pending but not being handled
    manager.paint_black(window).unwrap();

    let surface = manager.backend().surface(window).unwrap();
    assert!(surface.black_fills.is_empty());
    assert_eq!(surface.invalid, Some(WindowRect::new(0, 0, 640, 360)));
}

#[test]
fn test_destroy_from_inside_handler() {
    let manager = manager();
    let target = RecordingTarget::new();
    let (_host, window) = attached_window(&manager, &target);
    manager.backend().send_double_click(window, 1, 1).unwrap();

    let weak = Rc::downgrade(&manager);
    target.on_paint_run(move || {
        if let Some(manager) = weak.upgrade() {
            manager.destroy(window).unwrap();
        }
    });
    manager.backend().pump();

    assert!(!manager.contains(window));
    assert!(!manager.backend().is_live(window));
    // The queued double click died with the window
    assert_eq!(target.calls(), vec![Call::Paint]);
    assert_eq!(Rc::strong_count(&target), 1);
    assert_eq!(manager.stats().forwarded, 1);
}

#[test]
fn test_events_follow_the_right_target() {
    let manager = manager();
    let left = RecordingTarget::new();
    let right = RecordingTarget::new();
    let first = settled_window(&manager, &left);
    let second = settled_window(&manager, &right);
    manager.set_motion_events(first, true).unwrap();
    manager.set_motion_events(second, true).unwrap();

    // De-duplication is per window
    manager.backend().send_pointer_move(first, 3, 3).unwrap();
    manager.backend().send_pointer_move(second, 3, 3).unwrap();
    manager.backend().pump();

    assert_eq!(left.calls(), vec![Call::Paint, Call::Move(3, 3)]);
    assert_eq!(right.calls(), vec![Call::Paint, Call::Move(3, 3)]);
}
