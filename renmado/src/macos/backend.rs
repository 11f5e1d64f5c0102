use core_graphics::display::CGDisplay;
use core_graphics::event::{CGEvent, CGEventType, CGMouseButton, EventField, ScrollEventUnit};
use core_graphics::event_source::{CGEventSource, CGEventSourceStateID};
use core_graphics::geometry::{CGPoint, CGSize};
use objc2_app_kit::{NSApplicationActivationOptions, NSRunningApplication};

use renmado_ipc::{KeyEventKind, MouseEventKind};

use super::accessibility::{
    find_window, get_focused_window, AXError, AXUIElement, AX_ERROR_API_DISABLED,
};
use super::display::get_all_displays;
use super::SYNTHETIC_EVENT_MARKER;
use crate::core::{InputEvent, Monitor, Point, Rect, WindowHandle, WindowInfo, WHEEL_DELTA};
use crate::error::Error;
use crate::platform::{WindowManipulator, WindowSystem};

fn ax_error(operation: &'static str, err: AXError) -> Error {
    if err == AX_ERROR_API_DISABLED {
        Error::PermissionDenied
    } else {
        Error::os(operation, format!("AXError {}", err))
    }
}

fn window(handle: WindowHandle) -> Result<AXUIElement, Error> {
    find_window(handle).map_err(|err| {
        if err == AX_ERROR_API_DISABLED {
            Error::PermissionDenied
        } else {
            Error::WindowNotFound(handle.pid)
        }
    })
}

fn event_source() -> Result<CGEventSource, Error> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState)
        .map_err(|()| Error::os("CGEventSourceCreate", "no event source"))
}

fn cg_point(point: Point) -> CGPoint {
    CGPoint::new(point.x as f64, point.y as f64)
}

/// Accessibility and Quartz event services backed window system.
///
/// There is no z-band for other applications' windows on macOS, so
/// `set_topmost(true)` raises the window and `set_topmost(false)` does nothing.
#[derive(Debug, Default)]
pub struct MacBackend;

impl MacBackend {
    pub fn new() -> Self {
        Self
    }

    fn post(&self, pid: i32, event: CGEvent) {
        // Marked so our own tap skips it
        event.set_integer_value_field(EventField::EVENT_SOURCE_USER_DATA, SYNTHETIC_EVENT_MARKER);
        event.post_to_pid(pid);
    }

    fn mouse_event(&self, point: Point, kind: MouseEventKind) -> Result<CGEvent, Error> {
        let (event_type, button) = match kind {
            MouseEventKind::MouseMove => (CGEventType::MouseMoved, CGMouseButton::Left),
            MouseEventKind::MouseDown => (CGEventType::LeftMouseDown, CGMouseButton::Left),
            MouseEventKind::MouseUp => (CGEventType::LeftMouseUp, CGMouseButton::Left),
            MouseEventKind::RightDown => (CGEventType::RightMouseDown, CGMouseButton::Right),
            MouseEventKind::RightUp => (CGEventType::RightMouseUp, CGMouseButton::Right),
        };
        CGEvent::new_mouse_event(event_source()?, event_type, cg_point(point), button)
            .map_err(|()| Error::os("CGEventCreateMouseEvent", kind))
    }
}

impl WindowSystem for MacBackend {
    fn enumerate_monitors(&self) -> Result<Vec<Monitor>, Error> {
        Ok(get_all_displays())
    }

    fn discover_windows(&self, pid: i32) -> Result<Vec<WindowInfo>, Error> {
        let app = AXUIElement::application(pid);
        let windows = match app.windows() {
            Ok(windows) => windows,
            Err(AX_ERROR_API_DISABLED) => return Err(Error::PermissionDenied),
            Err(err) => {
                // Not running, or no windows yet
                tracing::debug!("No AX windows for pid {}: {}", pid, err);
                return Ok(Vec::new());
            }
        };
        Ok(windows
            .iter()
            .filter_map(|window| window.window_info(pid))
            .collect())
    }

    fn window_frame(&self, handle: WindowHandle) -> Option<Rect> {
        find_window(handle).ok()?.frame().ok()
    }

    fn foreground_window(&self) -> Option<WindowHandle> {
        let focused = get_focused_window().ok()?;
        let pid = focused.pid().ok()?;
        let id = focused.window_id().ok()?;
        Some(WindowHandle::new(id as u64, pid))
    }

    fn cursor_position(&self) -> Result<Point, Error> {
        let event =
            CGEvent::new(event_source()?).map_err(|()| Error::os("CGEventCreate", "no event"))?;
        let location = event.location();
        Ok(Point::new(location.x.round() as i32, location.y.round() as i32))
    }
}

impl WindowManipulator for MacBackend {
    fn restore_if_minimized(&self, handle: WindowHandle) -> Result<(), Error> {
        let window = window(handle)?;
        if window.is_minimized().unwrap_or(false) {
            window
                .set_minimized(false)
                .map_err(|e| ax_error("AXMinimized", e))?;
        }
        Ok(())
    }

    fn bring_to_front(&self, handle: WindowHandle) -> Result<(), Error> {
        let window = window(handle)?;
        objc2::rc::autoreleasepool(|_pool| {
            if let Some(app) =
                NSRunningApplication::runningApplicationWithProcessIdentifier(handle.pid)
            {
                #[allow(deprecated)]
                let _ = app.activateWithOptions(
                    NSApplicationActivationOptions::ActivateIgnoringOtherApps,
                );
            }
        });
        window.raise().map_err(|e| ax_error("AXRaise", e))
    }

    fn clear_maximized(&self, handle: WindowHandle) -> Result<(), Error> {
        let window = window(handle)?;
        if window.is_full_screen().unwrap_or(false) {
            window
                .set_full_screen(false)
                .map_err(|e| ax_error("AXFullScreen", e))?;
        }
        Ok(())
    }

    fn apply_rect(&self, handle: WindowHandle, rect: Rect, preserve_size: bool) -> Result<(), Error> {
        let window = window(handle)?;
        window
            .set_position(cg_point(rect.origin()))
            .map_err(|e| ax_error("AXPosition", e))?;
        if !preserve_size {
            window
                .set_size(CGSize::new(rect.width as f64, rect.height as f64))
                .map_err(|e| ax_error("AXSize", e))?;
        }
        Ok(())
    }

    fn set_topmost(&self, handle: WindowHandle, topmost: bool) -> Result<(), Error> {
        if topmost {
            window(handle)?.raise().map_err(|e| ax_error("AXRaise", e))?;
        }
        Ok(())
    }

    fn warp_cursor(&self, point: Point) -> Result<(), Error> {
        CGDisplay::warp_mouse_cursor_position(cg_point(point))
            .map_err(|e| Error::os("CGWarpMouseCursorPosition", e))
    }

    fn post_input(&self, handle: WindowHandle, event: &InputEvent) -> Result<(), Error> {
        match *event {
            InputEvent::Mouse { point, kind } => {
                let event = self.mouse_event(point, kind)?;
                self.post(handle.pid, event);
            }
            InputEvent::Key(stroke) => {
                let down = stroke.kind == KeyEventKind::KeyDown;
                let event = CGEvent::new_keyboard_event(event_source()?, stroke.code as u16, down)
                    .map_err(|()| Error::os("CGEventCreateKeyboardEvent", stroke.code))?;
                self.post(handle.pid, event);
            }
            InputEvent::Wheel {
                point,
                delta_x,
                delta_y,
            } => {
                let event = CGEvent::new_scroll_event(
                    event_source()?,
                    ScrollEventUnit::LINE,
                    2,
                    delta_y / WHEEL_DELTA,
                    delta_x / WHEEL_DELTA,
                    0,
                )
                .map_err(|()| Error::os("CGEventCreateScrollWheelEvent", "wheel"))?;
                event.set_location(cg_point(point));
                self.post(handle.pid, event);
            }
        }
        Ok(())
    }
}
