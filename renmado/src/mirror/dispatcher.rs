use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use renmado_ipc::{ControlAction, KeyEventKind, MouseEventKind};

use super::capture::{CapturedEvent, DispatchMessage};
use super::notify::NotifierHandle;
use super::replay::{deliver_mouse, CursorChoreography};
use super::session::MirrorSession;
use crate::core::{
    discover, is_clipboard_shortcut, resolve_target, translate_point, InputEvent,
    KeyDeduplicator, KeyStroke, Modifiers, MirrorTarget, Point, WindowClassifier,
};
use crate::platform::PlatformWindowBackend;

struct PendingWheel {
    point: Point,
    delta_x: i32,
    delta_y: i32,
    since: Instant,
}

/// Single consumer of the capture queue. Owns the session snapshot and does
/// all translation and replay, off the hook thread.
pub struct Dispatcher<B: PlatformWindowBackend + ?Sized> {
    backend: Arc<B>,
    classifier: Arc<dyn WindowClassifier>,
    session: MirrorSession,
    notifier: NotifierHandle,
    choreography: CursorChoreography,
    dedup: KeyDeduplicator,
    wheel_window: Duration,
    pending_wheel: Option<PendingWheel>,
}

impl<B: PlatformWindowBackend + ?Sized> Dispatcher<B> {
    pub fn new(
        backend: Arc<B>,
        classifier: Arc<dyn WindowClassifier>,
        session: MirrorSession,
        notifier: NotifierHandle,
    ) -> Self {
        let options = session.options;
        Self {
            backend,
            classifier,
            notifier,
            choreography: CursorChoreography::from_timing(&options.context_menu),
            dedup: KeyDeduplicator::new(Duration::from_millis(options.key_dedup_ms)),
            wheel_window: Duration::from_millis(options.wheel_coalesce_ms),
            pending_wheel: None,
            session,
        }
    }

    pub fn run(mut self, rx: Receiver<DispatchMessage>) {
        tracing::debug!(
            "Mirror dispatcher started (master pid {}, {} slaves)",
            self.session.master_pid(),
            self.session.slaves.len()
        );

        loop {
            let deadline = self
                .pending_wheel
                .as_ref()
                .map(|pending| pending.since + self.wheel_window);
            let message = match deadline {
                Some(deadline) => {
                    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(message) => message,
                        Err(RecvTimeoutError::Timeout) => {
                            self.flush_wheel();
                            continue;
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };

            match message {
                DispatchMessage::Input(event) => self.handle(event),
                DispatchMessage::Shutdown => break,
            }
        }

        self.flush_wheel();
        tracing::debug!("Mirror dispatcher stopped");
    }

    fn handle(&mut self, event: CapturedEvent) {
        if !self
            .session
            .is_master_focus(self.backend.foreground_window())
        {
            tracing::trace!("Master not focused, ignoring {:?}", event);
            return;
        }

        let options = self.session.options;
        match event {
            CapturedEvent::Mouse { kind, point } if options.mouse => {
                if kind == MouseEventKind::MouseMove {
                    self.mirror_move(point);
                } else {
                    self.mirror_button(kind, point);
                }
            }
            CapturedEvent::Key {
                code,
                kind,
                modifiers,
            } if options.keyboard => self.mirror_key(code, kind, modifiers),
            CapturedEvent::Wheel {
                point,
                delta_x,
                delta_y,
            } if options.wheel => self.queue_wheel(point, delta_x, delta_y),
            _ => {}
        }
    }

    fn mirror_move(&self, point: Point) {
        let master = &self.session.master.frame;
        if !master.contains(point) {
            return;
        }
        for slave in &self.session.slaves {
            let target = translate_point(master, None, &slave.frame, None, point);
            let event = InputEvent::Mouse {
                point: target,
                kind: MouseEventKind::MouseMove,
            };
            if let Err(e) = self.backend.post_input(slave.handle, &event) {
                tracing::debug!("Move to pid {} failed: {}", slave.pid(), e);
            }
        }
    }

    fn mirror_button(&mut self, kind: MouseEventKind, point: Point) {
        if kind.is_press() {
            self.session.refresh_frames(&*self.backend);
        }

        let master_set = discover(
            &*self.backend,
            &*self.classifier,
            self.session.master_pid(),
        );
        let master_popup = master_set.popup_at(point);
        if master_popup.is_none() && !self.session.master.frame.contains(point) {
            tracing::trace!("{} at ({}, {}) outside master", kind, point.x, point.y);
            return;
        }

        for slave in &self.session.slaves {
            let target = match master_popup {
                Some(popup) => {
                    let slave_set = discover(&*self.backend, &*self.classifier, slave.pid());
                    resolve_target(
                        &self.session.master,
                        Some(popup),
                        slave,
                        &slave_set.extensions,
                        point,
                    )
                }
                None => MirrorTarget {
                    window: slave.handle,
                    point: translate_point(
                        &self.session.master.frame,
                        None,
                        &slave.frame,
                        None,
                        point,
                    ),
                },
            };

            tracing::debug!(
                "Mirroring {} to window {} (pid {}) at ({}, {})",
                kind,
                target.window.id,
                target.window.pid,
                target.point.x,
                target.point.y
            );
            if let Err(e) = deliver_mouse(&*self.backend, &self.choreography, target, kind) {
                tracing::warn!("Failed to mirror {} to pid {}: {}", kind, slave.pid(), e);
            }
        }

        if kind.is_left_button() {
            self.notifier.notify(ControlAction::MouseClickAction);
        }
    }

    fn mirror_key(&mut self, code: u32, kind: KeyEventKind, modifiers: Modifiers) {
        if self.session.options.ignore_clipboard_shortcuts && is_clipboard_shortcut(code, modifiers)
        {
            tracing::debug!("Not mirroring clipboard shortcut (key {:#x})", code);
            return;
        }
        if !self.dedup.accept(code, kind) {
            tracing::trace!("Duplicate {} for key {:#x}", kind, code);
            return;
        }

        let event = InputEvent::Key(KeyStroke::new(code, kind));
        for slave in &self.session.slaves {
            if let Err(e) = self.backend.post_input(slave.handle, &event) {
                tracing::warn!("Failed to mirror key to pid {}: {}", slave.pid(), e);
            }
        }
    }

    fn queue_wheel(&mut self, point: Point, delta_x: i32, delta_y: i32) {
        match &mut self.pending_wheel {
            Some(pending) => {
                pending.point = point;
                pending.delta_x += delta_x;
                pending.delta_y += delta_y;
            }
            None => {
                self.pending_wheel = Some(PendingWheel {
                    point,
                    delta_x,
                    delta_y,
                    since: Instant::now(),
                });
            }
        }
        if self.wheel_window.is_zero() {
            self.flush_wheel();
        }
    }

    fn flush_wheel(&mut self) {
        let Some(pending) = self.pending_wheel.take() else {
            return;
        };
        if pending.delta_x == 0 && pending.delta_y == 0 {
            return;
        }

        // The wheel message carries screen coordinates; the point goes out unchanged.
        let event = InputEvent::Wheel {
            point: pending.point,
            delta_x: pending.delta_x,
            delta_y: pending.delta_y,
        };
        for slave in &self.session.slaves {
            if let Err(e) = self.backend.post_input(slave.handle, &event) {
                tracing::warn!("Failed to mirror wheel to pid {}: {}", slave.pid(), e);
            }
        }
        self.notifier.notify(ControlAction::MouseWheelAction);
    }
}
