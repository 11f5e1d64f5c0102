use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;

use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, PeekMessageW, PostThreadMessageW, SetWindowsHookExW,
    UnhookWindowsHookEx, KBDLLHOOKSTRUCT, LLKHF_INJECTED, MSG, MSLLHOOKSTRUCT, PM_NOREMOVE,
    WH_KEYBOARD_LL, WH_MOUSE_LL, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP,
    WM_MOUSEHWHEEL, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP,
    WM_SYSKEYDOWN, WM_SYSKEYUP,
};

use renmado_ipc::{KeyEventKind, MouseEventKind};

use crate::core::{Modifiers, Point};
use crate::error::Error;
use crate::mirror::{lock, CaptureGuard, CaptureSink, CapturedEvent, InputCapture};

// Set on events synthesized by SendInput, including our own
const LLMHF_INJECTED: u32 = 0x0000_0001;

/// Only one set of low-level hooks exists per process; the procs read this.
static SINK: Mutex<Option<CaptureSink>> = Mutex::new(None);

/// Global `WH_MOUSE_LL` / `WH_KEYBOARD_LL` hooks on a dedicated message-loop thread.
#[derive(Debug, Default)]
pub struct Win32Capture;

impl Win32Capture {
    pub fn new() -> Self {
        Self
    }
}

impl InputCapture for Win32Capture {
    fn install(&self, sink: CaptureSink) -> Result<CaptureGuard, Error> {
        *lock(&SINK) = Some(sink);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<u32, Error>>();
        let thread = thread::Builder::new()
            .name("renmado-hooks".to_string())
            .spawn(move || hook_thread(ready_tx))
            .map_err(|e| Error::os("spawn hook thread", e))?;

        let thread_id = match ready_rx.recv() {
            Ok(Ok(thread_id)) => thread_id,
            Ok(Err(e)) => {
                let _ = thread.join();
                *lock(&SINK) = None;
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                *lock(&SINK) = None;
                return Err(Error::os("SetWindowsHookExW", "hook thread exited early"));
            }
        };

        tracing::info!("Installed low-level mouse and keyboard hooks");

        Ok(CaptureGuard::new(move || {
            if let Err(e) = unsafe { PostThreadMessageW(thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) }
            {
                tracing::warn!("Failed to stop hook thread: {}", e);
            }
            if thread.join().is_err() {
                tracing::warn!("Hook thread panicked");
            }
            *lock(&SINK) = None;
            tracing::info!("Removed low-level hooks");
        }))
    }
}

fn hook_thread(ready: mpsc::Sender<Result<u32, Error>>) {
    unsafe {
        // Create the message queue before anyone can post WM_QUIT to it
        let mut msg = MSG::default();
        let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);

        let mouse = match SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_proc), None, 0) {
            Ok(hook) => hook,
            Err(e) => {
                let _ = ready.send(Err(Error::os("SetWindowsHookExW(WH_MOUSE_LL)", e)));
                return;
            }
        };
        let keyboard = match SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_proc), None, 0) {
            Ok(hook) => hook,
            Err(e) => {
                let _ = UnhookWindowsHookEx(mouse);
                let _ = ready.send(Err(Error::os("SetWindowsHookExW(WH_KEYBOARD_LL)", e)));
                return;
            }
        };

        let _ = ready.send(Ok(GetCurrentThreadId()));

        // Low-level hooks are called on this thread while it pumps messages
        while GetMessageW(&mut msg, None, 0, 0).0 > 0 {}

        if let Err(e) = UnhookWindowsHookEx(keyboard) {
            tracing::warn!("Failed to remove keyboard hook: {}", e);
        }
        if let Err(e) = UnhookWindowsHookEx(mouse) {
            tracing::warn!("Failed to remove mouse hook: {}", e);
        }
    }
}

fn push(event: CapturedEvent) {
    if let Some(sink) = lock(&SINK).as_ref() {
        sink.push(event);
    }
}

unsafe extern "system" fn mouse_proc(ncode: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if ncode >= 0 {
        let info = &*(lparam.0 as *const MSLLHOOKSTRUCT);
        if info.flags & LLMHF_INJECTED == 0 {
            if let Some(event) = mouse_event(wparam.0 as u32, info) {
                push(event);
            }
        }
    }
    CallNextHookEx(None, ncode, wparam, lparam)
}

fn mouse_event(message: u32, info: &MSLLHOOKSTRUCT) -> Option<CapturedEvent> {
    let point = Point::new(info.pt.x, info.pt.y);
    let kind = match message {
        WM_MOUSEMOVE => MouseEventKind::MouseMove,
        WM_LBUTTONDOWN => MouseEventKind::MouseDown,
        WM_LBUTTONUP => MouseEventKind::MouseUp,
        WM_RBUTTONDOWN => MouseEventKind::RightDown,
        WM_RBUTTONUP => MouseEventKind::RightUp,
        WM_MOUSEWHEEL | WM_MOUSEHWHEEL => {
            // High word of mouseData is the signed wheel delta
            let delta = (info.mouseData >> 16) as u16 as i16 as i32;
            let (delta_x, delta_y) = if message == WM_MOUSEHWHEEL {
                (delta, 0)
            } else {
                (0, delta)
            };
            return Some(CapturedEvent::Wheel {
                point,
                delta_x,
                delta_y,
            });
        }
        _ => return None,
    };
    Some(CapturedEvent::Mouse { kind, point })
}

unsafe extern "system" fn keyboard_proc(ncode: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if ncode >= 0 {
        let info = &*(lparam.0 as *const KBDLLHOOKSTRUCT);
        if (info.flags & LLKHF_INJECTED).0 == 0 {
            let kind = match wparam.0 as u32 {
                WM_KEYDOWN | WM_SYSKEYDOWN => Some(KeyEventKind::KeyDown),
                WM_KEYUP | WM_SYSKEYUP => Some(KeyEventKind::KeyUp),
                _ => None,
            };
            if let Some(kind) = kind {
                push(CapturedEvent::Key {
                    code: info.vkCode,
                    kind,
                    modifiers: current_modifiers(),
                });
            }
        }
    }
    CallNextHookEx(None, ncode, wparam, lparam)
}

fn is_down(key: VIRTUAL_KEY) -> bool {
    unsafe { GetAsyncKeyState(key.0 as i32) < 0 }
}

fn current_modifiers() -> Modifiers {
    Modifiers {
        ctrl: is_down(VK_CONTROL),
        alt: is_down(VK_MENU),
        shift: is_down(VK_SHIFT),
        meta: is_down(VK_LWIN) || is_down(VK_RWIN),
    }
}
