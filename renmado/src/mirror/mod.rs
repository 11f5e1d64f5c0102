mod capture;
mod dispatcher;
mod notify;
mod replay;
mod session;

pub use capture::{CaptureGuard, CaptureSink, CapturedEvent, DispatchMessage, InputCapture};
pub use notify::{ControlActionCallback, ControlActionNotifier, NotifierHandle};
pub use replay::{deliver_mouse, CursorChoreography};
pub use session::MirrorSession;

use std::fmt;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use renmado_ipc::{GroupStatus, MirrorOptions};

use crate::core::{discover, Window, WindowClassifier};
use crate::error::Error;
use crate::platform::PlatformWindowBackend;
use dispatcher::Dispatcher;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err: PoisonError<_>| {
        tracing::warn!("Mutex poisoned, recovering");
        err.into_inner()
    })
}

/// Outcome of `start_group_control`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartStatus {
    Started { master_pid: i32, slaves: usize },
    MasterNotFound(i32),
    NoSlaves,
    /// Accessibility trust was requested from the user; start again once granted.
    PermissionPending,
}

impl StartStatus {
    pub fn is_started(&self) -> bool {
        matches!(self, StartStatus::Started { .. })
    }
}

impl fmt::Display for StartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartStatus::Started { master_pid, slaves } => {
                write!(f, "started: master {} mirroring to {} slaves", master_pid, slaves)
            }
            StartStatus::MasterNotFound(pid) => write!(f, "master window not found for pid {}", pid),
            StartStatus::NoSlaves => f.write_str("no slave windows found"),
            StartStatus::PermissionPending => {
                f.write_str("accessibility permission requested, start again once granted")
            }
        }
    }
}

struct ActiveSession {
    status: GroupStatus,
    guard: CaptureGuard,
    tx: SyncSender<DispatchMessage>,
    worker: JoinHandle<()>,
}

/// Owns the single active mirroring session and its hooks.
pub struct MirrorController<B: PlatformWindowBackend + ?Sized + 'static> {
    backend: Arc<B>,
    classifier: Arc<dyn WindowClassifier>,
    capture: Box<dyn InputCapture>,
    notifier: ControlActionNotifier,
    defaults: MirrorOptions,
    active: Mutex<Option<ActiveSession>>,
}

impl<B: PlatformWindowBackend + ?Sized + 'static> MirrorController<B> {
    pub fn new(
        backend: Arc<B>,
        classifier: Arc<dyn WindowClassifier>,
        capture: Box<dyn InputCapture>,
        defaults: MirrorOptions,
    ) -> Self {
        Self {
            backend,
            classifier,
            capture,
            notifier: ControlActionNotifier::new(),
            defaults,
            active: Mutex::new(None),
        }
    }

    /// Replace any running session with a new one for `master_pid`.
    ///
    /// The previous hooks are removed and its dispatcher joined before the new
    /// hooks go in, all under one lock.
    pub fn start_group_control(
        &self,
        master_pid: i32,
        slave_pids: &[i32],
        options: Option<MirrorOptions>,
    ) -> Result<StartStatus, Error> {
        let options = options.unwrap_or(self.defaults);
        let mut active = lock(&self.active);
        if let Some(previous) = active.take() {
            tracing::info!("Replacing active session (master pid {:?})", previous.status.master_pid);
            teardown(previous);
        }

        let Some(master) = discover(&*self.backend, &*self.classifier, master_pid).main else {
            tracing::warn!("No main window for master pid {}", master_pid);
            return Ok(StartStatus::MasterNotFound(master_pid));
        };

        let slaves: Vec<Window> = slave_pids
            .iter()
            .copied()
            .filter(|&pid| pid != master_pid)
            .filter_map(|pid| {
                let main = discover(&*self.backend, &*self.classifier, pid).main;
                if main.is_none() {
                    tracing::warn!("No main window for slave pid {}, leaving it out", pid);
                }
                main
            })
            .collect();
        if slaves.is_empty() {
            return Ok(StartStatus::NoSlaves);
        }

        let (tx, rx) = sync_channel(options.queue_capacity.max(1));
        let guard = match self.capture.install(CaptureSink::new(tx.clone())) {
            Ok(guard) => guard,
            Err(Error::PermissionDenied) => {
                tracing::warn!("Input capture needs accessibility permission");
                return Ok(StartStatus::PermissionPending);
            }
            Err(e) => return Err(e),
        };

        let session = MirrorSession::new(master, slaves, options);
        let status = session.status();
        let dispatcher = Dispatcher::new(
            self.backend.clone(),
            self.classifier.clone(),
            session,
            self.notifier.handle(),
        );
        let worker = std::thread::Builder::new()
            .name("renmado-mirror".into())
            .spawn(move || dispatcher.run(rx))
            .map_err(|e| Error::os("spawn mirror thread", e))?;

        tracing::info!(
            "Group control started: master {} -> slaves {:?}",
            master_pid,
            status.slave_pids
        );
        let result = StartStatus::Started {
            master_pid,
            slaves: status.slave_pids.len(),
        };
        *active = Some(ActiveSession {
            status,
            guard,
            tx,
            worker,
        });
        Ok(result)
    }

    /// Remove the hooks and end the session. Returns whether one was running.
    pub fn uninstall_hooks(&self) -> bool {
        match lock(&self.active).take() {
            Some(session) => {
                teardown(session);
                tracing::info!("Group control stopped");
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> GroupStatus {
        lock(&self.active)
            .as_ref()
            .map(|session| session.status.clone())
            .unwrap_or_default()
    }

    pub fn set_control_action_callback(&self, callback: Option<ControlActionCallback>) {
        self.notifier.set_callback(callback);
    }
}

impl<B: PlatformWindowBackend + ?Sized + 'static> Drop for MirrorController<B> {
    fn drop(&mut self) {
        self.uninstall_hooks();
    }
}

fn teardown(session: ActiveSession) {
    let ActiveSession {
        guard, tx, worker, ..
    } = session;
    // Hooks first, so nothing new is queued behind the shutdown message.
    drop(guard);
    if tx.send(DispatchMessage::Shutdown).is_err() {
        tracing::debug!("Mirror dispatcher already gone");
    }
    if worker.join().is_err() {
        tracing::warn!("Mirror dispatcher panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InputEvent, KeyStroke, Modifiers, Point, TitleClassifier, WindowHandle, DEFAULT_BRAND};
    use crate::platform::mock::{create_test_popup, create_test_window, MockBackend, MockCapture};
    use renmado_ipc::{ContextMenuTiming, ControlAction, KeyEventKind, MouseEventKind};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    const MASTER: WindowHandle = WindowHandle { id: 1, pid: 100 };
    const SLAVE_A: WindowHandle = WindowHandle { id: 2, pid: 200 };
    const SLAVE_B: WindowHandle = WindowHandle { id: 3, pid: 300 };

    fn backend() -> Arc<MockBackend> {
        Arc::new(
            MockBackend::new()
                .with_windows(vec![
                    create_test_window(1, 100, "Master - Google Chrome", 0, 0, 1000, 800),
                    create_test_window(2, 200, "A - Google Chrome", 1000, 0, 500, 400),
                    create_test_window(3, 300, "B - Google Chrome", 1000, 400, 1000, 800),
                ])
                .with_foreground(Some(MASTER))
                .with_cursor(Point::new(1, 1)),
        )
    }

    fn options() -> MirrorOptions {
        MirrorOptions {
            wheel_coalesce_ms: 0,
            key_dedup_ms: 0,
            context_menu: ContextMenuTiming {
                settle_ms: 0,
                restore_ms: 0,
            },
            ..MirrorOptions::default()
        }
    }

    fn controller(backend: Arc<MockBackend>, capture: &MockCapture) -> MirrorController<MockBackend> {
        MirrorController::new(
            backend,
            Arc::new(TitleClassifier::new(DEFAULT_BRAND)),
            Box::new(capture.clone()),
            options(),
        )
    }

    fn click(kind: MouseEventKind, x: i32, y: i32) -> CapturedEvent {
        CapturedEvent::Mouse {
            kind,
            point: Point::new(x, y),
        }
    }

    #[test]
    fn test_second_start_leaves_one_active_capture() {
        let capture = MockCapture::new();
        let controller = controller(backend(), &capture);

        assert!(controller
            .start_group_control(100, &[200], None)
            .unwrap()
            .is_started());
        assert!(controller
            .start_group_control(100, &[200, 300], None)
            .unwrap()
            .is_started());

        assert_eq!(capture.installs(), 2);
        assert_eq!(capture.active(), 1);
        assert_eq!(controller.status().slave_pids, vec![200, 300]);

        assert!(controller.uninstall_hooks());
        assert_eq!(capture.active(), 0);
        assert!(!controller.uninstall_hooks());
        assert!(!controller.status().is_active);
    }

    #[test]
    fn test_start_without_master_or_slaves() {
        let capture = MockCapture::new();
        let controller = controller(backend(), &capture);

        assert_eq!(
            controller.start_group_control(999, &[200], None).unwrap(),
            StartStatus::MasterNotFound(999)
        );
        assert_eq!(
            controller.start_group_control(100, &[100, 999], None).unwrap(),
            StartStatus::NoSlaves
        );
        assert_eq!(capture.installs(), 0);
    }

    #[test]
    fn test_failed_start_still_tears_down_previous() {
        let capture = MockCapture::new();
        let controller = controller(backend(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        assert_eq!(capture.active(), 1);
        controller.start_group_control(999, &[200], None).unwrap();
        assert_eq!(capture.active(), 0);
        assert!(!controller.status().is_active);
    }

    #[test]
    fn test_permission_denied_is_pending_not_error() {
        let capture = MockCapture::denied();
        let controller = controller(backend(), &capture);
        assert_eq!(
            controller.start_group_control(100, &[200], None).unwrap(),
            StartStatus::PermissionPending
        );
        assert!(!controller.status().is_active);
    }

    #[test]
    fn test_left_click_is_mirrored_proportionally_and_notified() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);
        let (tx, rx) = channel();
        let tx = Mutex::new(tx);
        controller.set_control_action_callback(Some(Box::new(move |action| {
            let _ = tx.lock().unwrap().send(action);
        })));

        controller
            .start_group_control(100, &[200, 300], None)
            .unwrap();
        assert!(capture.emit(click(MouseEventKind::MouseDown, 500, 400)));
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![
                (
                    SLAVE_A,
                    InputEvent::Mouse {
                        point: Point::new(1250, 200),
                        kind: MouseEventKind::MouseDown
                    }
                ),
                (
                    SLAVE_B,
                    InputEvent::Mouse {
                        point: Point::new(1500, 800),
                        kind: MouseEventKind::MouseDown
                    }
                ),
            ]
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(2)).unwrap(),
            ControlAction::MouseClickAction
        );
    }

    #[test]
    fn test_input_ignored_without_master_focus() {
        let backend = backend();
        backend.set_foreground(Some(SLAVE_A));
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        capture.emit(click(MouseEventKind::MouseDown, 500, 400));
        capture.emit(CapturedEvent::Key {
            code: 0x41,
            kind: KeyEventKind::KeyDown,
            modifiers: Modifiers::default(),
        });
        controller.uninstall_hooks();

        assert!(backend.posted().is_empty());
    }

    #[test]
    fn test_click_outside_master_is_not_mirrored() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        capture.emit(click(MouseEventKind::MouseDown, 1200, 100));
        controller.uninstall_hooks();

        assert!(backend.posted().is_empty());
    }

    #[test]
    fn test_moves_mirror_only_over_master_main_window() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        capture.emit(click(MouseEventKind::MouseMove, 1200, 100));
        capture.emit(click(MouseEventKind::MouseMove, 500, 400));
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![(
                SLAVE_A,
                InputEvent::Mouse {
                    point: Point::new(1250, 200),
                    kind: MouseEventKind::MouseMove
                }
            )]
        );
    }

    #[test]
    fn test_popup_click_targets_matching_slave_popup() {
        let backend = Arc::new(
            MockBackend::new()
                .with_windows(vec![
                    create_test_window(1, 100, "Master - Google Chrome", 0, 0, 1000, 800),
                    create_test_popup(11, 100, "Wallet", 1100, 40, 300, 400),
                    create_test_window(2, 200, "A - Google Chrome", 2000, 0, 1000, 800),
                    create_test_popup(21, 200, "Wallet", 3090, 50, 300, 400),
                    create_test_popup(22, 200, "Translate", 2050, 700, 200, 80),
                ])
                .with_foreground(Some(MASTER)),
        );
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        // Inside the master's popup, which hangs off the main window's right edge
        capture.emit(click(MouseEventKind::MouseUp, 1150, 100));
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![(
                WindowHandle::new(21, 200),
                InputEvent::Mouse {
                    point: Point::new(3140, 110),
                    kind: MouseEventKind::MouseUp
                }
            )]
        );
    }

    #[test]
    fn test_frames_refreshed_on_press() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        controller.start_group_control(100, &[200], None).unwrap();
        backend.set_frame(2, crate::core::Rect::new(0, 900, 1000, 800));
        capture.emit(click(MouseEventKind::MouseDown, 500, 400));
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![(
                SLAVE_A,
                InputEvent::Mouse {
                    point: Point::new(500, 1300),
                    kind: MouseEventKind::MouseDown
                }
            )]
        );
    }

    #[test]
    fn test_keys_mirrored_except_clipboard_shortcuts() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);
        let chord = if cfg!(target_os = "macos") {
            Modifiers {
                meta: true,
                ..Default::default()
            }
        } else {
            Modifiers {
                ctrl: true,
                ..Default::default()
            }
        };
        let copy_key = if cfg!(target_os = "macos") { 0x08 } else { 0x43 };

        controller.start_group_control(100, &[200], None).unwrap();
        capture.emit(CapturedEvent::Key {
            code: 0x25,
            kind: KeyEventKind::KeyDown,
            modifiers: Modifiers::default(),
        });
        capture.emit(CapturedEvent::Key {
            code: copy_key,
            kind: KeyEventKind::KeyDown,
            modifiers: chord,
        });
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![(
                SLAVE_A,
                InputEvent::Key(KeyStroke::new(0x25, KeyEventKind::KeyDown))
            )]
        );
    }

    #[test]
    fn test_wheel_is_coalesced_and_forwarded_as_is() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = MirrorController::new(
            backend.clone(),
            Arc::new(TitleClassifier::new(DEFAULT_BRAND)),
            Box::new(capture.clone()),
            MirrorOptions {
                wheel_coalesce_ms: 10_000,
                ..options()
            },
        );

        controller.start_group_control(100, &[200], None).unwrap();
        for _ in 0..3 {
            capture.emit(CapturedEvent::Wheel {
                point: Point::new(300, 300),
                delta_x: 0,
                delta_y: -120,
            });
        }
        // Shutdown flushes what is pending
        controller.uninstall_hooks();

        assert_eq!(
            backend.posted(),
            vec![(
                SLAVE_A,
                InputEvent::Wheel {
                    point: Point::new(300, 300),
                    delta_x: 0,
                    delta_y: -360
                }
            )]
        );
    }

    #[test]
    fn test_disabled_channels_are_not_mirrored() {
        let backend = backend();
        let capture = MockCapture::new();
        let controller = controller(backend.clone(), &capture);

        let options = MirrorOptions {
            mouse: false,
            ..options()
        };
        controller
            .start_group_control(100, &[200], Some(options))
            .unwrap();
        capture.emit(click(MouseEventKind::MouseDown, 500, 400));
        capture.emit(CapturedEvent::Wheel {
            point: Point::new(1, 1),
            delta_x: 0,
            delta_y: 120,
        });
        controller.uninstall_hooks();

        let posted = backend.posted();
        assert_eq!(posted.len(), 1);
        assert!(matches!(posted[0].1, InputEvent::Wheel { .. }));
    }
}
