use renmado_ipc::{GroupStatus, MirrorOptions};

use crate::core::{Rect, Window, WindowHandle};
use crate::platform::WindowSystem;

/// The master window and the slave main windows input is replayed onto.
/// Built once per start; only frames change afterwards.
#[derive(Debug, Clone)]
pub struct MirrorSession {
    pub master: Window,
    pub slaves: Vec<Window>,
    pub options: MirrorOptions,
}

impl MirrorSession {
    pub fn new(master: Window, slaves: Vec<Window>, options: MirrorOptions) -> Self {
        Self {
            master,
            slaves,
            options,
        }
    }

    pub fn master_pid(&self) -> i32 {
        self.master.pid()
    }

    pub fn slave_pids(&self) -> Vec<i32> {
        self.slaves.iter().map(Window::pid).collect()
    }

    pub fn status(&self) -> GroupStatus {
        GroupStatus {
            is_active: true,
            master_pid: Some(self.master_pid()),
            slave_pids: self.slave_pids(),
        }
    }

    /// Any window of the master process counts, so its popups keep input flowing.
    pub fn is_master_focus(&self, foreground: Option<WindowHandle>) -> bool {
        foreground.is_some_and(|handle| handle.pid == self.master_pid())
    }

    /// Re-read every frame; windows that can no longer be queried keep their last frame.
    pub fn refresh_frames<S: WindowSystem + ?Sized>(&mut self, ws: &S) {
        refresh(ws, &mut self.master.frame, self.master.handle);
        for slave in &mut self.slaves {
            refresh(ws, &mut slave.frame, slave.handle);
        }
    }
}

fn refresh<S: WindowSystem + ?Sized>(ws: &S, frame: &mut Rect, handle: WindowHandle) {
    match ws.window_frame(handle) {
        Some(current) => *frame = current,
        None => tracing::debug!("Window {} (pid {}) frame unavailable", handle.id, handle.pid),
    }
}
