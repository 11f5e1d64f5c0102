mod enumerate;
mod hook;
mod manipulate;

pub use hook::Win32Capture;

use crate::core::{InputEvent, Monitor, Point, Rect, WindowHandle, WindowInfo};
use crate::error::Error;
use crate::platform::{WindowManipulator, WindowSystem};

/// User32-backed window system. Stateless; every call goes straight to the OS.
#[derive(Debug, Default)]
pub struct Win32Backend;

impl Win32Backend {
    pub fn new() -> Self {
        Self
    }
}

impl WindowSystem for Win32Backend {
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, Error> {
        enumerate::enumerate_monitors()
    }

    fn discover_windows(&self, pid: i32) -> Result<Vec<WindowInfo>, Error> {
        enumerate::process_windows(pid)
    }

    fn window_frame(&self, handle: WindowHandle) -> Option<Rect> {
        enumerate::window_frame(handle)
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        enumerate::foreground_window()
    }

    fn cursor_position(&self) -> Result<Point, Error> {
        enumerate::cursor_position()
    }
}

impl WindowManipulator for Win32Backend {
    fn restore_if_minimized(&self, handle: WindowHandle) -> Result<(), Error> {
        manipulate::restore_if_minimized(handle)
    }

    fn bring_to_front(&self, handle: WindowHandle) -> Result<(), Error> {
        manipulate::bring_to_front(handle)
    }

    fn clear_maximized(&self, handle: WindowHandle) -> Result<(), Error> {
        manipulate::clear_maximized(handle)
    }

    fn apply_rect(&self, handle: WindowHandle, rect: Rect, preserve_size: bool) -> Result<(), Error> {
        manipulate::apply_rect(handle, rect, preserve_size)
    }

    fn set_topmost(&self, handle: WindowHandle, topmost: bool) -> Result<(), Error> {
        manipulate::set_topmost(handle, topmost)
    }

    fn warp_cursor(&self, point: Point) -> Result<(), Error> {
        manipulate::warp_cursor(point)
    }

    fn post_input(&self, handle: WindowHandle, event: &InputEvent) -> Result<(), Error> {
        manipulate::post_input(handle, event)
    }
}
