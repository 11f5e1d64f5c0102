use std::time::Duration;

use renmado_ipc::{ContextMenuTiming, MouseEventKind};

use crate::core::{InputEvent, MirrorTarget, Point};
use crate::error::Error;
use crate::platform::PlatformWindowBackend;

/// Global cursor teleport around a right-button event. Context menus read the
/// real pointer position when they open, not the coordinates of the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorChoreography {
    /// Pause after warping, before the event is submitted.
    pub settle: Duration,
    /// Pause after submitting, before the cursor is put back.
    pub restore: Duration,
}

impl CursorChoreography {
    pub fn from_timing(timing: &ContextMenuTiming) -> Self {
        Self {
            settle: Duration::from_millis(timing.settle_ms),
            restore: Duration::from_millis(timing.restore_ms),
        }
    }

    pub fn perform<B, F>(&self, backend: &B, target: Point, submit: F) -> Result<(), Error>
    where
        B: PlatformWindowBackend + ?Sized,
        F: FnOnce() -> Result<(), Error>,
    {
        let saved = backend.cursor_position()?;
        backend.warp_cursor(target)?;
        sleep(self.settle);

        let result = submit();

        sleep(self.restore);
        if let Err(e) = backend.warp_cursor(saved) {
            tracing::warn!("Failed to restore cursor to ({}, {}): {}", saved.x, saved.y, e);
        }
        result
    }
}

impl Default for CursorChoreography {
    fn default() -> Self {
        Self::from_timing(&ContextMenuTiming::default())
    }
}

fn sleep(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// Post one mouse event to `target`, teleporting the cursor for right-button events.
pub fn deliver_mouse<B: PlatformWindowBackend + ?Sized>(
    backend: &B,
    choreography: &CursorChoreography,
    target: MirrorTarget,
    kind: MouseEventKind,
) -> Result<(), Error> {
    let event = InputEvent::Mouse {
        point: target.point,
        kind,
    };
    if kind.is_right_button() {
        choreography.perform(backend, target.point, || {
            backend.post_input(target.window, &event)
        })
    } else {
        backend.post_input(target.window, &event)
    }
}
