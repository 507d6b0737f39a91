//! Conversion of X11 core-protocol events into backend events.

use crate::{
    backend::BackendEvent,
    input::{keyboard::KeyCode, translate::x11 as translate, translate::x11::KeysymTable},
};

use ::tracing::{trace, warn};
use ::x11rb::protocol::{
    xproto::{Atom, KeyReleaseEvent, Mapping, NotifyMode, Window},
    Event,
};

/// Atoms identifying the window manager's close request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct CloseProtocol {
    pub(super) wm_protocols: Atom,
    pub(super) wm_delete_window: Atom,
}

/// A side effect the connection owner must act on after a conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Followup {
    None,
    /// The server's keyboard mapping changed and must be reloaded.
    RefreshKeyboard,
    /// The window was configured by the server itself. Its position is
    /// relative to the parent, which is the window manager's frame once the
    /// window is reparented, so the screen position must be queried.
    QueryPosition,
    /// The window no longer exists on the server.
    Destroyed,
}

/// `true` if `next` is the press half of a synthesized autorepeat pair: the
/// server reports a held key as a release immediately followed by a press of
/// the same keycode with the same timestamp.
pub(super) fn is_autorepeat(release: &KeyReleaseEvent, next: &Event) -> bool {
    matches!(
        next,
        Event::KeyPress(press) if press.detail == release.detail && press.time == release.time
    )
}

/// Pulls the next event to convert, dropping the release half of every
/// autorepeat pair.
///
/// `lookahead` carries an event read ahead of its turn between calls.
/// `source` yields queued events and `None` once the queue is empty or
/// unreadable.
pub(super) fn next_folded(
    lookahead: &mut Option<Event>,
    source: &mut dyn FnMut() -> Option<Event>,
) -> Option<Event> {
    loop {
        let event = lookahead.take().or_else(|| source())?;

        if let Event::KeyRelease(release) = &event {
            if let Some(next) = source() {
                let repeat = is_autorepeat(release, &next);
                *lookahead = Some(next);
                if repeat {
                    trace!(keycode = release.detail, "Autorepeat");
                    continue;
                }
            }
        }

        return Some(event);
    }
}

/// Events sent by another client through `SendEvent` have the high bit of
/// their response type set.
const fn is_synthetic(response_type: u8) -> bool {
    response_type & 0x80 != 0
}

const fn is_wheel(code: KeyCode) -> bool {
    matches!(
        code,
        KeyCode::WheelUp | KeyCode::WheelDown | KeyCode::WheelLeft | KeyCode::WheelRight
    )
}

/// Converts one event for `window`, reporting the resulting backend events to
/// `emit`.
pub(super) fn convert(
    event: &Event,
    window: Window,
    close: CloseProtocol,
    keysyms: &KeysymTable,
    emit: &mut dyn FnMut(BackendEvent),
) -> Followup {
    match event {
        Event::KeyPress(e) => emit(BackendEvent::KeyPress(keysyms.translate(e.detail))),
        Event::KeyRelease(e) => emit(BackendEvent::KeyRelease(keysyms.translate(e.detail))),
        Event::ButtonPress(e) => {
            let code = translate::translate_button(e.detail);
            emit(BackendEvent::KeyPress(code));
            if is_wheel(code) {
                emit(BackendEvent::KeyRelease(code));
            }
        }
        Event::ButtonRelease(e) => {
            // Wheel releases were already reported together with the press.
            let code = translate::translate_button(e.detail);
            if !is_wheel(code) {
                emit(BackendEvent::KeyRelease(code));
            }
        }
        Event::MotionNotify(e) => emit(BackendEvent::CursorMoved {
            x: e.event_x.max(0) as u32,
            y: e.event_y.max(0) as u32,
        }),
        Event::ConfigureNotify(e) if e.window == window => {
            emit(BackendEvent::Resized {
                width: u32::from(e.width),
                height: u32::from(e.height),
            });
            // Window managers send synthetic notifications in root
            // coordinates.
            if !is_synthetic(e.response_type) {
                return Followup::QueryPosition;
            }
            emit(BackendEvent::Moved {
                x: i32::from(e.x),
                y: i32::from(e.y),
            });
        }
        Event::MapNotify(e) if e.window == window => emit(BackendEvent::Minimized(false)),
        Event::UnmapNotify(e) if e.window == window => emit(BackendEvent::Minimized(true)),
        Event::FocusIn(e) if !matches!(e.mode, NotifyMode::GRAB | NotifyMode::UNGRAB) => {
            emit(BackendEvent::Focus(true))
        }
        Event::FocusOut(e) if !matches!(e.mode, NotifyMode::GRAB | NotifyMode::UNGRAB) => {
            emit(BackendEvent::Focus(false))
        }
        Event::EnterNotify(e) if e.mode == NotifyMode::NORMAL => {
            emit(BackendEvent::CursorEntered(true))
        }
        Event::LeaveNotify(e) if e.mode == NotifyMode::NORMAL => {
            emit(BackendEvent::CursorEntered(false))
        }
        Event::ClientMessage(e)
            if e.format == 32
                && e.type_ == close.wm_protocols
                && e.data.as_data32()[0] == close.wm_delete_window =>
        {
            emit(BackendEvent::CloseRequested)
        }
        Event::DestroyNotify(e) if e.window == window => {
            emit(BackendEvent::CloseRequested);
            return Followup::Destroyed;
        }
        Event::MappingNotify(e) if e.request == Mapping::KEYBOARD => {
            return Followup::RefreshKeyboard;
        }
        Event::Error(e) => warn!(error = ?e, "X11 protocol error"),
        other => trace!(event = ?other, "Unhandled X11 event"),
    }

    Followup::None
}

#[cfg(test)]
mod tests {
    use super::*;

    use ::pretty_assertions::assert_eq;
    use ::std::collections::VecDeque;
    use ::x11rb::protocol::xproto::{
        ButtonPressEvent, ClientMessageEvent, ConfigureNotifyEvent, DestroyNotifyEvent,
        EnterNotifyEvent, FocusInEvent, KeyPressEvent, MapNotifyEvent, MappingNotifyEvent,
        Motion, MotionNotifyEvent, NotifyDetail, UnmapNotifyEvent, BUTTON_PRESS_EVENT,
        BUTTON_RELEASE_EVENT, CONFIGURE_NOTIFY_EVENT, DESTROY_NOTIFY_EVENT, ENTER_NOTIFY_EVENT,
        FOCUS_IN_EVENT, FOCUS_OUT_EVENT, KEY_PRESS_EVENT, KEY_RELEASE_EVENT, LEAVE_NOTIFY_EVENT,
        MAPPING_NOTIFY_EVENT, MAP_NOTIFY_EVENT, MOTION_NOTIFY_EVENT, UNMAP_NOTIFY_EVENT,
    };

    const WINDOW: Window = 0x0040_0001;
    const CLOSE: CloseProtocol = CloseProtocol {
        wm_protocols: 301,
        wm_delete_window: 302,
    };

    fn keysyms() -> KeysymTable {
        // Keycode 38 is 'a' on a typical evdev layout.
        let mut keysyms = vec![0; (38 - 8 + 1) * 2];
        keysyms[(38 - 8) * 2] = 0x61;
        keysyms[(38 - 8) * 2 + 1] = 0x41;
        KeysymTable::new(8, 2, keysyms)
    }

    fn key(response_type: u8, keycode: u8, time: u32) -> KeyPressEvent {
        KeyPressEvent {
            response_type,
            detail: keycode,
            sequence: 0,
            time,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: 0u16.into(),
            same_screen: true,
        }
    }

    fn button(response_type: u8, button: u8) -> ButtonPressEvent {
        ButtonPressEvent {
            response_type,
            detail: button,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: 0u16.into(),
            same_screen: true,
        }
    }

    fn convert_one(event: &Event) -> (Vec<BackendEvent>, Followup) {
        let keysyms = keysyms();
        let mut out = Vec::new();
        let followup = convert(event, WINDOW, CLOSE, &keysyms, &mut |e| out.push(e));
        (out, followup)
    }

    fn convert_all(events: &[Event]) -> Vec<BackendEvent> {
        let keysyms = keysyms();
        let mut out = Vec::new();
        for event in events {
            convert(event, WINDOW, CLOSE, &keysyms, &mut |e| out.push(e));
        }
        out
    }

    #[test]
    fn test_autorepeat_detection() {
        let release = key(KEY_RELEASE_EVENT, 38, 1000);

        assert!(is_autorepeat(
            &release,
            &Event::KeyPress(key(KEY_PRESS_EVENT, 38, 1000))
        ));
        assert!(!is_autorepeat(
            &release,
            &Event::KeyPress(key(KEY_PRESS_EVENT, 38, 1001))
        ));
        assert!(!is_autorepeat(
            &release,
            &Event::KeyPress(key(KEY_PRESS_EVENT, 39, 1000))
        ));
        assert!(!is_autorepeat(
            &release,
            &Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 1000))
        ));
    }

    /// Keys resolve through the keyboard mapping; unmapped keycodes are still
    /// delivered.
    #[test]
    fn test_keys() {
        let events = convert_all(&[
            Event::KeyPress(key(KEY_PRESS_EVENT, 38, 1)),
            Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 2)),
            Event::KeyPress(key(KEY_PRESS_EVENT, 200, 3)),
        ]);

        assert_eq!(
            events,
            vec![
                BackendEvent::KeyPress(KeyCode::A),
                BackendEvent::KeyRelease(KeyCode::A),
                BackendEvent::KeyPress(KeyCode::Unsupported),
            ]
        );
    }

    /// Wheel "buttons" report press and release on the press; their release
    /// is dropped.
    #[test]
    fn test_buttons_and_wheel() {
        let events = convert_all(&[
            Event::ButtonPress(button(BUTTON_PRESS_EVENT, 3)),
            Event::ButtonRelease(button(BUTTON_RELEASE_EVENT, 3)),
            Event::ButtonPress(button(BUTTON_PRESS_EVENT, 5)),
            Event::ButtonRelease(button(BUTTON_RELEASE_EVENT, 5)),
            Event::ButtonPress(button(BUTTON_PRESS_EVENT, 8)),
        ]);

        assert_eq!(
            events,
            vec![
                BackendEvent::KeyPress(KeyCode::MouseRight),
                BackendEvent::KeyRelease(KeyCode::MouseRight),
                BackendEvent::KeyPress(KeyCode::WheelDown),
                BackendEvent::KeyRelease(KeyCode::WheelDown),
                BackendEvent::KeyPress(KeyCode::MouseButton4),
            ]
        );
    }

    #[test]
    fn test_motion_clamped() {
        let motion = MotionNotifyEvent {
            response_type: MOTION_NOTIFY_EVENT,
            detail: Motion::NORMAL,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: -3,
            event_y: 42,
            state: 0u16.into(),
            same_screen: true,
        };
        let events = convert_all(&[Event::MotionNotify(motion)]);

        assert_eq!(events, vec![BackendEvent::CursorMoved { x: 0, y: 42 }]);
    }

    fn configure(response_type: u8, window: Window, x: i16, y: i16) -> ConfigureNotifyEvent {
        ConfigureNotifyEvent {
            response_type,
            sequence: 0,
            event: window,
            window,
            above_sibling: 0,
            x,
            y,
            width: 640,
            height: 480,
            border_width: 0,
            override_redirect: false,
        }
    }

    /// Synthetic notifications from the window manager carry the screen
    /// position.
    #[test]
    fn test_synthetic_configure_reports_position() {
        let event = Event::ConfigureNotify(configure(CONFIGURE_NOTIFY_EVENT | 0x80, WINDOW, 10, -20));
        let (events, followup) = convert_one(&event);

        assert_eq!(
            events,
            vec![
                BackendEvent::Resized {
                    width: 640,
                    height: 480
                },
                BackendEvent::Moved { x: 10, y: -20 },
            ]
        );
        assert_eq!(followup, Followup::None);
    }

    /// Server notifications are relative to the frame of a reparented window;
    /// their position is never reported as is.
    #[test]
    fn test_server_configure_queries_position() {
        let event = Event::ConfigureNotify(configure(CONFIGURE_NOTIFY_EVENT, WINDOW, 0, 0));
        let (events, followup) = convert_one(&event);

        assert_eq!(
            events,
            vec![BackendEvent::Resized {
                width: 640,
                height: 480
            }]
        );
        assert_eq!(followup, Followup::QueryPosition);
    }

    #[test]
    fn test_configure_of_other_window_ignored() {
        let event = Event::ConfigureNotify(configure(CONFIGURE_NOTIFY_EVENT | 0x80, WINDOW + 1, 5, 5));
        let (events, followup) = convert_one(&event);

        assert!(events.is_empty());
        assert_eq!(followup, Followup::None);
    }

    #[test]
    fn test_map_and_unmap() {
        let unmap = UnmapNotifyEvent {
            response_type: UNMAP_NOTIFY_EVENT,
            sequence: 0,
            event: WINDOW,
            window: WINDOW,
            from_configure: false,
        };
        let map = MapNotifyEvent {
            response_type: MAP_NOTIFY_EVENT,
            sequence: 0,
            event: WINDOW,
            window: WINDOW,
            override_redirect: false,
        };
        let events = convert_all(&[Event::UnmapNotify(unmap), Event::MapNotify(map)]);

        assert_eq!(
            events,
            vec![
                BackendEvent::Minimized(true),
                BackendEvent::Minimized(false),
            ]
        );
    }

    /// Focus changes caused by keyboard grabs are not focus changes of the
    /// window.
    #[test]
    fn test_focus_ignores_grabs() {
        let focus = |response_type, mode| FocusInEvent {
            response_type,
            detail: NotifyDetail::NONLINEAR,
            sequence: 0,
            event: WINDOW,
            mode,
        };
        let events = convert_all(&[
            Event::FocusIn(focus(FOCUS_IN_EVENT, NotifyMode::NORMAL)),
            Event::FocusOut(focus(FOCUS_OUT_EVENT, NotifyMode::GRAB)),
            Event::FocusIn(focus(FOCUS_IN_EVENT, NotifyMode::UNGRAB)),
            Event::FocusOut(focus(FOCUS_OUT_EVENT, NotifyMode::WHILE_GRABBED)),
        ]);

        assert_eq!(
            events,
            vec![BackendEvent::Focus(true), BackendEvent::Focus(false)]
        );
    }

    #[test]
    fn test_crossing_only_in_normal_mode() {
        let crossing = |response_type, mode| EnterNotifyEvent {
            response_type,
            detail: NotifyDetail::NONLINEAR,
            sequence: 0,
            time: 0,
            root: 1,
            event: WINDOW,
            child: 0,
            root_x: 0,
            root_y: 0,
            event_x: 0,
            event_y: 0,
            state: 0u16.into(),
            mode,
            same_screen_focus: 0,
        };
        let events = convert_all(&[
            Event::EnterNotify(crossing(ENTER_NOTIFY_EVENT, NotifyMode::GRAB)),
            Event::EnterNotify(crossing(ENTER_NOTIFY_EVENT, NotifyMode::NORMAL)),
            Event::LeaveNotify(crossing(LEAVE_NOTIFY_EVENT, NotifyMode::UNGRAB)),
            Event::LeaveNotify(crossing(LEAVE_NOTIFY_EVENT, NotifyMode::NORMAL)),
        ]);

        assert_eq!(
            events,
            vec![
                BackendEvent::CursorEntered(true),
                BackendEvent::CursorEntered(false),
            ]
        );
    }

    #[test]
    fn test_destroy_requests_close() {
        let destroy = |window| {
            Event::DestroyNotify(DestroyNotifyEvent {
                response_type: DESTROY_NOTIFY_EVENT,
                sequence: 0,
                event: window,
                window,
            })
        };

        assert_eq!(
            convert_one(&destroy(WINDOW)),
            (vec![BackendEvent::CloseRequested], Followup::Destroyed)
        );
        assert_eq!(convert_one(&destroy(WINDOW + 1)), (vec![], Followup::None));
    }

    #[test]
    fn test_keyboard_mapping_change() {
        let mapping = |request| {
            Event::MappingNotify(MappingNotifyEvent {
                response_type: MAPPING_NOTIFY_EVENT,
                sequence: 0,
                request,
                first_keycode: 8,
                count: 248,
            })
        };

        assert_eq!(
            convert_one(&mapping(Mapping::KEYBOARD)),
            (vec![], Followup::RefreshKeyboard)
        );
        assert_eq!(
            convert_one(&mapping(Mapping::POINTER)),
            (vec![], Followup::None)
        );
    }

    /// `(kind, keycode, time)` of the key events produced by folding.
    fn fold_all(events: Vec<Event>) -> Vec<(&'static str, u8, u32)> {
        let mut queue = VecDeque::from(events);
        let mut lookahead = None;
        let mut folded = Vec::new();
        while let Some(event) = next_folded(&mut lookahead, &mut || queue.pop_front()) {
            folded.push(match event {
                Event::KeyPress(e) => ("press", e.detail, e.time),
                Event::KeyRelease(e) => ("release", e.detail, e.time),
                _ => ("other", 0, 0),
            });
        }
        folded
    }

    /// A held key reads as repeated presses.
    #[test]
    fn test_fold_autorepeat_pair() {
        let folded = fold_all(vec![
            Event::KeyPress(key(KEY_PRESS_EVENT, 38, 10)),
            Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 20)),
            Event::KeyPress(key(KEY_PRESS_EVENT, 38, 20)),
            Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 30)),
        ]);

        assert_eq!(
            folded,
            vec![("press", 38, 10), ("press", 38, 20), ("release", 38, 30)]
        );
    }

    #[test]
    fn test_fold_keeps_release_at_end_of_queue() {
        let folded = fold_all(vec![Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 30))]);

        assert_eq!(folded, vec![("release", 38, 30)]);
    }

    /// Releases of two keys at the same instant are both real releases.
    #[test]
    fn test_fold_keeps_back_to_back_releases() {
        let folded = fold_all(vec![
            Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 30)),
            Event::KeyRelease(key(KEY_RELEASE_EVENT, 39, 30)),
            Event::KeyPress(key(KEY_PRESS_EVENT, 40, 31)),
        ]);

        assert_eq!(
            folded,
            vec![("release", 38, 30), ("release", 39, 30), ("press", 40, 31)]
        );
    }

    /// A release whose lookahead read fails is still handed out, so it is
    /// converted before the failure is reported.
    #[test]
    fn test_fold_returns_release_when_lookahead_fails() {
        let mut queue = VecDeque::from(vec![Event::KeyRelease(key(KEY_RELEASE_EVENT, 38, 30))]);
        let mut failed = false;
        let mut lookahead = None;

        let event = next_folded(&mut lookahead, &mut || {
            queue.pop_front().or_else(|| {
                failed = true;
                None
            })
        });

        assert!(matches!(event, Some(Event::KeyRelease(e)) if e.detail == 38));
        assert!(failed);
        assert!(lookahead.is_none());
    }

    /// Only `WM_DELETE_WINDOW` through `WM_PROTOCOLS` is a close request.
    #[test]
    fn test_close_request() {
        let delete = ClientMessageEvent::new(
            32,
            WINDOW,
            CLOSE.wm_protocols,
            [CLOSE.wm_delete_window, 0, 0, 0, 0],
        );
        let other = ClientMessageEvent::new(32, WINDOW, CLOSE.wm_protocols, [999, 0, 0, 0, 0]);
        let events = convert_all(&[Event::ClientMessage(other), Event::ClientMessage(delete)]);

        assert_eq!(events, vec![BackendEvent::CloseRequested]);
    }
}
