use std::ffi::c_void;

use windows::Win32::Foundation::{BOOL, HWND, LPARAM, POINT, RECT, TRUE};
use windows::Win32::Graphics::Gdi::{EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR, MONITORINFO};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetCursorPos, GetForegroundWindow, GetWindowLongW, GetWindowRect,
    GetWindowTextLengthW, GetWindowTextW, GetWindowThreadProcessId, IsIconic, IsWindow,
    IsWindowVisible, GWL_STYLE, WS_OVERLAPPEDWINDOW,
};

use crate::core::{Monitor, Point, Rect, WindowHandle, WindowInfo};
use crate::error::Error;

// MONITORINFOF_PRIMARY
const PRIMARY_FLAG: u32 = 1;

pub(super) fn hwnd(handle: WindowHandle) -> Result<HWND, Error> {
    if handle.id == 0 {
        return Err(Error::WindowNotFound(handle.pid));
    }
    Ok(HWND(handle.id as *mut c_void))
}

pub(super) fn handle_of(hwnd: HWND) -> Option<WindowHandle> {
    if hwnd.is_invalid() {
        return None;
    }
    let mut pid: u32 = 0;
    unsafe { GetWindowThreadProcessId(hwnd, Some(&mut pid)) };
    Some(WindowHandle::new(hwnd.0 as u64, pid as i32))
}

/// Work areas of every display, taskbar excluded.
pub fn enumerate_monitors() -> Result<Vec<Monitor>, Error> {
    let mut monitors: Vec<Monitor> = Vec::new();

    let ok = unsafe {
        EnumDisplayMonitors(
            None,
            None,
            Some(collect_monitor),
            LPARAM(&mut monitors as *mut Vec<Monitor> as isize),
        )
    };
    if !ok.as_bool() {
        return Err(Error::os("EnumDisplayMonitors", "enumeration aborted"));
    }

    tracing::debug!("Enumerated {} monitors", monitors.len());
    Ok(monitors)
}

unsafe extern "system" fn collect_monitor(
    hmonitor: HMONITOR,
    _hdc: HDC,
    _clip: *mut RECT,
    lparam: LPARAM,
) -> BOOL {
    let monitors = &mut *(lparam.0 as *mut Vec<Monitor>);

    let mut info = MONITORINFO {
        cbSize: std::mem::size_of::<MONITORINFO>() as u32,
        ..Default::default()
    };
    if GetMonitorInfoW(hmonitor, &mut info).as_bool() {
        let work = info.rcWork;
        monitors.push(Monitor::new(
            Rect::from_edges(work.left, work.top, work.right, work.bottom),
            info.dwFlags & PRIMARY_FLAG != 0,
        ));
    } else {
        tracing::warn!("GetMonitorInfoW failed for monitor {:?}", hmonitor.0);
    }
    // Keep going even if one monitor could not be read
    TRUE
}

struct ProcessWindows {
    pid: u32,
    windows: Vec<WindowInfo>,
}

/// Every top-level window owned by `pid`, in z-order.
pub fn process_windows(pid: i32) -> Result<Vec<WindowInfo>, Error> {
    let mut context = ProcessWindows {
        pid: pid as u32,
        windows: Vec::new(),
    };

    unsafe {
        EnumWindows(
            Some(collect_window),
            LPARAM(&mut context as *mut ProcessWindows as isize),
        )
    }
    .map_err(|e| Error::os("EnumWindows", e))?;

    Ok(context.windows)
}

unsafe extern "system" fn collect_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let context = &mut *(lparam.0 as *mut ProcessWindows);

    let mut pid: u32 = 0;
    GetWindowThreadProcessId(hwnd, Some(&mut pid));
    if pid == context.pid {
        context.windows.push(window_info(hwnd, pid as i32));
    }
    TRUE
}

unsafe fn window_info(hwnd: HWND, pid: i32) -> WindowInfo {
    let style = GetWindowLongW(hwnd, GWL_STYLE) as u32;

    WindowInfo {
        handle: WindowHandle::new(hwnd.0 as u64, pid),
        title: window_title(hwnd),
        frame: window_rect(hwnd).unwrap_or_default(),
        is_visible: IsWindowVisible(hwnd).as_bool(),
        is_minimized: IsIconic(hwnd).as_bool(),
        is_standard: style & WS_OVERLAPPEDWINDOW.0 != 0,
    }
}

unsafe fn window_title(hwnd: HWND) -> String {
    let len = GetWindowTextLengthW(hwnd);
    if len <= 0 {
        return String::new();
    }
    let mut buf: Vec<u16> = vec![0; len as usize + 1];
    let copied = GetWindowTextW(hwnd, &mut buf);
    String::from_utf16_lossy(&buf[..copied.max(0) as usize])
}

unsafe fn window_rect(hwnd: HWND) -> Option<Rect> {
    let mut rect = RECT::default();
    GetWindowRect(hwnd, &mut rect).ok()?;
    Some(Rect::from_edges(rect.left, rect.top, rect.right, rect.bottom))
}

pub fn window_frame(handle: WindowHandle) -> Option<Rect> {
    let hwnd = hwnd(handle).ok()?;
    unsafe {
        if !IsWindow(hwnd).as_bool() {
            return None;
        }
        window_rect(hwnd)
    }
}

pub fn foreground_window() -> Option<WindowHandle> {
    handle_of(unsafe { GetForegroundWindow() })
}

pub fn cursor_position() -> Result<Point, Error> {
    let mut point = POINT::default();
    unsafe { GetCursorPos(&mut point) }.map_err(|e| Error::os("GetCursorPos", e))?;
    Ok(Point::new(point.x, point.y))
}
