use windows::Win32::Foundation::{
    GetLastError, SetLastError, HWND, LPARAM, POINT, WIN32_ERROR, WPARAM,
};
use windows::Win32::Graphics::Gdi::{MapWindowPoints, ScreenToClient};
use windows::Win32::System::Threading::{AttachThreadInput, GetCurrentThreadId};
use windows::Win32::UI::Input::KeyboardAndMouse::{MapVirtualKeyW, MAPVK_VK_TO_VSC};
use windows::Win32::UI::WindowsAndMessaging::{
    BringWindowToTop, ChildWindowFromPointEx, GetWindowLongW, GetWindowThreadProcessId, IsIconic,
    PostMessageW, SetCursorPos, SetForegroundWindow, SetWindowLongW, SetWindowPos, ShowWindow,
    CWP_SKIPDISABLED, CWP_SKIPINVISIBLE, CWP_SKIPTRANSPARENT, GWL_STYLE, HWND_NOTOPMOST,
    HWND_TOPMOST, SET_WINDOW_POS_FLAGS, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
    SW_RESTORE, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MOUSEHWHEEL,
    WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_RBUTTONDOWN, WM_RBUTTONUP, WS_MAXIMIZE, WS_MINIMIZE,
};

use renmado_ipc::{KeyEventKind, MouseEventKind};

use super::enumerate::{hwnd, window_frame};
use crate::core::{mouse_lparam, wheel_wparam, InputEvent, KeyStroke, Point, Rect, WindowHandle};
use crate::error::Error;

const MK_LBUTTON: usize = 0x0001;
const MK_RBUTTON: usize = 0x0002;
/// Chrome nests its content a few windows deep; stop well before anything pathological.
const MAX_CHILD_DEPTH: usize = 8;

pub fn restore_if_minimized(handle: WindowHandle) -> Result<(), Error> {
    let hwnd = hwnd(handle)?;
    unsafe {
        if IsIconic(hwnd).as_bool() {
            // Return value is the previous visibility, not success
            let _ = ShowWindow(hwnd, SW_RESTORE);
        }
    }
    Ok(())
}

/// `SetForegroundWindow` only works for the foreground thread, so attach to the
/// target's input queue for the duration of the call.
pub fn bring_to_front(handle: WindowHandle) -> Result<(), Error> {
    let hwnd = hwnd(handle)?;
    unsafe {
        let target_thread = GetWindowThreadProcessId(hwnd, None);
        let current_thread = GetCurrentThreadId();

        let attached = target_thread != 0
            && target_thread != current_thread
            && AttachThreadInput(current_thread, target_thread, true).as_bool();

        let mut raised = SetForegroundWindow(hwnd).as_bool();
        if !raised {
            raised = BringWindowToTop(hwnd).is_ok();
        }

        if attached {
            let _ = AttachThreadInput(current_thread, target_thread, false);
        }

        if raised {
            Ok(())
        } else {
            Err(Error::os(
                "SetForegroundWindow",
                format!("window {} refused activation", handle.id),
            ))
        }
    }
}

pub fn clear_maximized(handle: WindowHandle) -> Result<(), Error> {
    let hwnd = hwnd(handle)?;
    let style = unsafe { GetWindowLongW(hwnd, GWL_STYLE) } as u32;
    let Some(cleared) = without_max_min(style) else {
        return Ok(());
    };
    // A previous style of 0 is only a failure if the call also set the last error
    let previous = unsafe {
        SetLastError(WIN32_ERROR(0));
        SetWindowLongW(hwnd, GWL_STYLE, cleared as i32)
    };
    style_update_result(previous, unsafe { GetLastError() })?;
    tracing::debug!("Cleared max/min style on window {}", handle.id);
    Ok(())
}

/// The style with the maximized/minimized bits removed, or `None` if neither is set.
fn without_max_min(style: u32) -> Option<u32> {
    let cleared = style & !(WS_MAXIMIZE.0 | WS_MINIMIZE.0);
    (cleared != style).then_some(cleared)
}

fn style_update_result(previous: i32, last_error: WIN32_ERROR) -> Result<(), Error> {
    if previous == 0 && last_error.0 != 0 {
        return Err(Error::os(
            "SetWindowLongW",
            format!("Failed to set window style (error {})", last_error.0),
        ));
    }
    Ok(())
}

pub fn apply_rect(handle: WindowHandle, rect: Rect, preserve_size: bool) -> Result<(), Error> {
    let hwnd = hwnd(handle)?;
    let mut flags: SET_WINDOW_POS_FLAGS = SWP_NOZORDER | SWP_NOACTIVATE;
    if preserve_size {
        flags |= SWP_NOSIZE;
    }
    unsafe {
        SetWindowPos(
            hwnd,
            None,
            rect.x,
            rect.y,
            rect.width as i32,
            rect.height as i32,
            flags,
        )
    }
    .map_err(|e| Error::os("SetWindowPos", e))
}

pub fn set_topmost(handle: WindowHandle, topmost: bool) -> Result<(), Error> {
    let hwnd = hwnd(handle)?;
    let insert_after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
    unsafe {
        SetWindowPos(
            hwnd,
            insert_after,
            0,
            0,
            0,
            0,
            SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
        )
    }
    .map_err(|e| Error::os("SetWindowPos(topmost)", e))
}

pub fn warp_cursor(point: Point) -> Result<(), Error> {
    unsafe { SetCursorPos(point.x, point.y) }.map_err(|e| Error::os("SetCursorPos", e))
}

/// Deepest visible, enabled child under `screen`, with `screen` in its client space.
fn target_at(top: HWND, screen: Point) -> (HWND, POINT) {
    let mut target = top;
    let mut client = POINT {
        x: screen.x,
        y: screen.y,
    };
    unsafe {
        let _ = ScreenToClient(target, &mut client);
        for _ in 0..MAX_CHILD_DEPTH {
            let child = ChildWindowFromPointEx(
                target,
                client,
                CWP_SKIPINVISIBLE | CWP_SKIPDISABLED | CWP_SKIPTRANSPARENT,
            );
            if child.is_invalid() || child == target {
                break;
            }
            let mut points = [client];
            MapWindowPoints(target, child, &mut points);
            client = points[0];
            target = child;
        }
    }
    (target, client)
}

fn post(hwnd: HWND, message: u32, wparam: usize, lparam: isize) -> Result<(), Error> {
    unsafe { PostMessageW(hwnd, message, WPARAM(wparam), LPARAM(lparam)) }
        .map_err(|e| Error::os("PostMessageW", e))
}

pub fn post_input(handle: WindowHandle, event: &InputEvent) -> Result<(), Error> {
    let top = hwnd(handle)?;
    match *event {
        InputEvent::Mouse { point, kind } => {
            let (target, client) = target_at(top, point);
            let (message, buttons) = match kind {
                MouseEventKind::MouseMove => (WM_MOUSEMOVE, 0),
                MouseEventKind::MouseDown => (WM_LBUTTONDOWN, MK_LBUTTON),
                MouseEventKind::MouseUp => (WM_LBUTTONUP, 0),
                MouseEventKind::RightDown => (WM_RBUTTONDOWN, MK_RBUTTON),
                MouseEventKind::RightUp => (WM_RBUTTONUP, 0),
            };
            post(target, message, buttons, mouse_lparam(client.x, client.y))
        }
        InputEvent::Key(stroke) => post_key(top, handle, stroke),
        InputEvent::Wheel {
            point,
            delta_x,
            delta_y,
        } => {
            let (target, _) = target_at(top, content_point(handle));
            // Wheel messages carry screen coordinates
            let lparam = mouse_lparam(point.x, point.y);
            if delta_y != 0 {
                post(target, WM_MOUSEWHEEL, wheel_wparam(delta_y), lparam)?;
            }
            if delta_x != 0 {
                post(target, WM_MOUSEHWHEEL, wheel_wparam(delta_x), lparam)?;
            }
            Ok(())
        }
    }
}

fn post_key(top: HWND, handle: WindowHandle, stroke: KeyStroke) -> Result<(), Error> {
    let (target, _) = target_at(top, content_point(handle));
    let scan = unsafe { MapVirtualKeyW(stroke.code, MAPVK_VK_TO_VSC) };
    let message = match stroke.kind {
        KeyEventKind::KeyDown => WM_KEYDOWN,
        KeyEventKind::KeyUp => WM_KEYUP,
    };
    post(target, message, stroke.code as usize, stroke.message_lparam(scan))
}

/// Key and wheel input goes to whatever content sits in the middle of the window.
fn content_point(handle: WindowHandle) -> Point {
    window_frame(handle)
        .map(|frame| frame.center())
        .unwrap_or_default()
}
