use crate::core::{InputEvent, Monitor, Point, Rect, WindowHandle, WindowInfo};
use crate::error::Error;

/// Trait for querying windows, displays and pointer state from the system.
/// This abstraction allows mocking in tests.
pub trait WindowSystem {
    /// Displays in OS order, `frame` being the usable area.
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, Error>;
    /// Top-level windows owned by `pid`, unfiltered and unclassified.
    fn discover_windows(&self, pid: i32) -> Result<Vec<WindowInfo>, Error>;
    fn window_frame(&self, handle: WindowHandle) -> Option<Rect>;
    fn foreground_window(&self) -> Option<WindowHandle>;
    fn cursor_position(&self) -> Result<Point, Error>;
}

/// Trait for manipulating windows and injecting input (side effects).
/// This abstraction allows mocking in tests.
pub trait WindowManipulator {
    fn restore_if_minimized(&self, handle: WindowHandle) -> Result<(), Error>;
    fn bring_to_front(&self, handle: WindowHandle) -> Result<(), Error>;
    /// Drop maximize/minimize (or zoomed/full-screen) state so the frame can be set.
    fn clear_maximized(&self, handle: WindowHandle) -> Result<(), Error>;
    /// Move to `rect`'s origin; resize too unless `preserve_size`.
    fn apply_rect(&self, handle: WindowHandle, rect: Rect, preserve_size: bool)
        -> Result<(), Error>;
    fn set_topmost(&self, handle: WindowHandle, topmost: bool) -> Result<(), Error>;
    fn warp_cursor(&self, point: Point) -> Result<(), Error>;
    fn post_input(&self, handle: WindowHandle, event: &InputEvent) -> Result<(), Error>;
}

/// Everything the engine needs from an operating system.
pub trait PlatformWindowBackend: WindowSystem + WindowManipulator + Send + Sync {}

impl<T: WindowSystem + WindowManipulator + Send + Sync> PlatformWindowBackend for T {}
