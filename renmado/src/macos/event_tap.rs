use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use core_foundation::base::TCFType;
use core_foundation::runloop::{kCFRunLoopCommonModes, CFRunLoop};
use core_foundation_sys::mach_port::CFMachPortRef;
use core_foundation_sys::runloop::{CFRunLoopRef, CFRunLoopStop};
use core_graphics::event::{
    CGEvent, CGEventFlags, CGEventTap, CGEventTapLocation, CGEventTapOptions,
    CGEventTapPlacement, CGEventType, CallbackResult, EventField,
};

use renmado_ipc::{KeyEventKind, MouseEventKind};

use super::accessibility::is_trusted_with_prompt;
use super::SYNTHETIC_EVENT_MARKER;
use crate::core::{Modifiers, Point, WHEEL_DELTA};
use crate::error::Error;
use crate::mirror::{CaptureGuard, CaptureSink, CapturedEvent, InputCapture};

extern "C" {
    fn CGEventTapEnable(tap: CFMachPortRef, enable: bool);
}

/// Raw run loop pointer handed back from the tap thread so the guard can stop it.
struct RunLoopHandle(CFRunLoopRef);

// CFRunLoopStop is documented as safe to call from any thread
unsafe impl Send for RunLoopHandle {}

/// Listen-only session event tap on its own run loop thread.
#[derive(Debug, Default)]
pub struct MacCapture;

impl MacCapture {
    pub fn new() -> Self {
        Self
    }
}

impl InputCapture for MacCapture {
    fn install(&self, sink: CaptureSink) -> Result<CaptureGuard, Error> {
        if !is_trusted_with_prompt() {
            tracing::warn!("Accessibility permission not granted, requested from the user");
            return Err(Error::PermissionDenied);
        }

        let (ready_tx, ready_rx) = mpsc::channel::<Result<RunLoopHandle, Error>>();
        let thread = thread::Builder::new()
            .name("renmado-event-tap".to_string())
            .spawn(move || tap_thread(sink, ready_tx))
            .map_err(|e| Error::os("spawn event tap thread", e))?;

        let run_loop = match ready_rx.recv() {
            Ok(Ok(run_loop)) => run_loop,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(Error::os("CGEventTapCreate", "event tap thread exited early"));
            }
        };

        tracing::info!("Event tap installed");

        Ok(CaptureGuard::new(move || {
            unsafe { CFRunLoopStop(run_loop.0) };
            if thread.join().is_err() {
                tracing::warn!("Event tap thread panicked");
            }
            tracing::info!("Event tap removed");
        }))
    }
}

fn tap_thread(sink: CaptureSink, ready: mpsc::Sender<Result<RunLoopHandle, Error>>) {
    let mach_port: Arc<AtomicPtr<c_void>> = Arc::new(AtomicPtr::new(ptr::null_mut()));
    let mach_port_for_callback = Arc::clone(&mach_port);

    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::MouseMoved,
            CGEventType::LeftMouseDragged,
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseUp,
            CGEventType::RightMouseDown,
            CGEventType::RightMouseUp,
            CGEventType::ScrollWheel,
            CGEventType::KeyDown,
            CGEventType::KeyUp,
        ],
        move |_proxy, event_type, event| {
            if matches!(
                event_type,
                CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput
            ) {
                tracing::warn!("Event tap disabled, re-enabling");
                let port = mach_port_for_callback.load(Ordering::Acquire);
                if !port.is_null() {
                    unsafe { CGEventTapEnable(port as CFMachPortRef, true) };
                }
                return CallbackResult::Keep;
            }

            if event.get_integer_value_field(EventField::EVENT_SOURCE_USER_DATA)
                == SYNTHETIC_EVENT_MARKER
            {
                return CallbackResult::Keep;
            }
            if let Some(captured) = translate(event_type, event) {
                sink.push(captured);
            }
            CallbackResult::Keep
        },
    );

    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(Error::PermissionDenied));
            return;
        }
    };
    mach_port.store(
        tap.mach_port().as_concrete_TypeRef() as *mut c_void,
        Ordering::Release,
    );

    let source = match tap.mach_port().create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(Error::os(
                "CFMachPortCreateRunLoopSource",
                "could not create run loop source for event tap",
            )));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    run_loop.add_source(&source, unsafe { kCFRunLoopCommonModes });
    tap.enable();

    if ready
        .send(Ok(RunLoopHandle(run_loop.as_concrete_TypeRef())))
        .is_err()
    {
        return;
    }

    CFRunLoop::run_current();
    run_loop.remove_source(&source, unsafe { kCFRunLoopCommonModes });
}

fn translate(event_type: CGEventType, event: &CGEvent) -> Option<CapturedEvent> {
    let location = event.location();
    let point = Point::new(location.x.round() as i32, location.y.round() as i32);

    let mouse = |kind| Some(CapturedEvent::Mouse { kind, point });
    let key = |kind| {
        Some(CapturedEvent::Key {
            code: event.get_integer_value_field(EventField::KEYBOARD_EVENT_KEYCODE) as u32,
            kind,
            modifiers: modifiers(event.get_flags()),
        })
    };

    match event_type {
        CGEventType::MouseMoved | CGEventType::LeftMouseDragged => {
            mouse(MouseEventKind::MouseMove)
        }
        CGEventType::LeftMouseDown => mouse(MouseEventKind::MouseDown),
        CGEventType::LeftMouseUp => mouse(MouseEventKind::MouseUp),
        CGEventType::RightMouseDown => mouse(MouseEventKind::RightDown),
        CGEventType::RightMouseUp => mouse(MouseEventKind::RightUp),
        CGEventType::KeyDown => key(KeyEventKind::KeyDown),
        CGEventType::KeyUp => key(KeyEventKind::KeyUp),
        CGEventType::ScrollWheel => {
            // Line deltas, scaled to the Windows notch size used everywhere else
            let lines_y =
                event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_1);
            let lines_x =
                event.get_integer_value_field(EventField::SCROLL_WHEEL_EVENT_DELTA_AXIS_2);
            Some(CapturedEvent::Wheel {
                point,
                delta_x: lines_x as i32 * WHEEL_DELTA,
                delta_y: lines_y as i32 * WHEEL_DELTA,
            })
        }
        _ => None,
    }
}

fn modifiers(flags: CGEventFlags) -> Modifiers {
    Modifiers {
        ctrl: flags.contains(CGEventFlags::CGEventFlagControl),
        alt: flags.contains(CGEventFlags::CGEventFlagAlternate),
        shift: flags.contains(CGEventFlags::CGEventFlagShift),
        meta: flags.contains(CGEventFlags::CGEventFlagCommand),
    }
}
