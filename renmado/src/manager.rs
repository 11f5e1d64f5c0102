use std::sync::Arc;

use renmado_ipc::{
    ArrangeReport, GroupStatus, KeyEventKind, MirrorOptions, MouseEventKind, WindowBounds,
};

use crate::arranger;
use crate::core::{
    discover, order_monitors, resolve_target, ClassifiedWindowSet, Config, InputEvent, KeyStroke,
    LayoutRequest, MirrorTarget, Monitor, Point, WindowClassifier, WindowHandle,
};
use crate::error::Error;
use crate::mirror::{
    deliver_mouse, ControlActionCallback, CursorChoreography, InputCapture, MirrorController,
    StartStatus,
};
use crate::platform::PlatformWindowBackend;

/// Every boundary operation, over one platform backend.
///
/// Queries re-resolve windows from process ids on every call; nothing about
/// live windows is kept between calls except inside a mirroring session.
pub struct WindowManager<B: PlatformWindowBackend + ?Sized + 'static> {
    backend: Arc<B>,
    classifier: Arc<dyn WindowClassifier>,
    choreography: CursorChoreography,
    mirror: MirrorController<B>,
}

impl<B: PlatformWindowBackend + ?Sized + 'static> WindowManager<B> {
    pub fn new(backend: Arc<B>, capture: Box<dyn InputCapture>, config: &Config) -> Self {
        let classifier = config.classifier();
        Self::with_classifier(backend, capture, classifier, config.mirror)
    }

    pub fn with_classifier(
        backend: Arc<B>,
        capture: Box<dyn InputCapture>,
        classifier: Arc<dyn WindowClassifier>,
        mirror_defaults: MirrorOptions,
    ) -> Self {
        let mirror = MirrorController::new(
            backend.clone(),
            classifier.clone(),
            capture,
            mirror_defaults,
        );
        Self {
            backend,
            classifier,
            choreography: CursorChoreography::from_timing(&mirror_defaults.context_menu),
            mirror,
        }
    }

    /// Displays ordered non-primary first.
    pub fn get_monitors(&self) -> Result<Vec<Monitor>, Error> {
        Ok(order_monitors(self.backend.enumerate_monitors()?))
    }

    pub fn arrange_windows(&self, request: &LayoutRequest) -> Result<ArrangeReport, Error> {
        arranger::arrange(&*self.backend, &*self.classifier, request)
    }

    pub fn list_windows(&self, pid: i32) -> ClassifiedWindowSet {
        discover(&*self.backend, &*self.classifier, pid)
    }

    /// Main window geometry; `success` is false (zeroed) when there is none.
    pub fn get_window_bounds(&self, pid: i32) -> WindowBounds {
        match self.list_windows(pid).main {
            Some(main) => WindowBounds {
                x: main.frame.x,
                y: main.frame.y,
                width: main.frame.width,
                height: main.frame.height,
                success: true,
            },
            None => WindowBounds::default(),
        }
    }

    pub fn send_mouse_event(&self, pid: i32, x: i32, y: i32, kind: MouseEventKind) -> bool {
        let Some(main) = self.list_windows(pid).main else {
            tracing::debug!("send_mouse_event: no main window for pid {}", pid);
            return false;
        };
        let target = MirrorTarget {
            window: main.handle,
            point: Point::new(x, y),
        };
        self.deliver(target, kind)
    }

    /// Deliver an event clicked at (`x`, `y`) on the master to the matching
    /// place on the slave, popup-aware.
    pub fn send_mouse_event_with_popup_matching(
        &self,
        master_pid: i32,
        slave_pid: i32,
        x: i32,
        y: i32,
        kind: MouseEventKind,
    ) -> bool {
        let master = self.list_windows(master_pid);
        let slave = self.list_windows(slave_pid);
        let (Some(master_main), Some(slave_main)) = (&master.main, &slave.main) else {
            tracing::debug!(
                "Popup matching needs both main windows (master {}, slave {})",
                master_pid,
                slave_pid
            );
            return false;
        };

        let point = Point::new(x, y);
        let target = resolve_target(
            master_main,
            master.popup_at(point),
            slave_main,
            &slave.extensions,
            point,
        );
        self.deliver(target, kind)
    }

    pub fn send_keyboard_event(&self, pid: i32, key_code: u32, kind: KeyEventKind) -> bool {
        let Some(main) = self.list_windows(pid).main else {
            return false;
        };
        let stroke = KeyStroke::new(key_code, kind);
        self.post(main.handle, &InputEvent::Key(stroke))
    }

    /// Deltas are in `WHEEL_DELTA` units. The event is positioned at the
    /// current cursor, or the window center if the cursor cannot be read.
    pub fn send_wheel_event(&self, pid: i32, delta_x: i32, delta_y: i32) -> bool {
        let Some(main) = self.list_windows(pid).main else {
            return false;
        };
        let point = self
            .backend
            .cursor_position()
            .unwrap_or_else(|_| main.frame.center());
        self.post(
            main.handle,
            &InputEvent::Wheel {
                point,
                delta_x,
                delta_y,
            },
        )
    }

    pub fn is_process_window_active(&self, pid: i32) -> bool {
        self.backend
            .foreground_window()
            .is_some_and(|handle| handle.pid == pid)
    }

    pub fn start_group_control(
        &self,
        master_pid: i32,
        slave_pids: &[i32],
        options: Option<MirrorOptions>,
    ) -> Result<StartStatus, Error> {
        self.mirror
            .start_group_control(master_pid, slave_pids, options)
    }

    pub fn uninstall_hooks(&self) -> bool {
        self.mirror.uninstall_hooks()
    }

    pub fn group_status(&self) -> GroupStatus {
        self.mirror.status()
    }

    pub fn set_control_action_callback(&self, callback: Option<ControlActionCallback>) {
        self.mirror.set_control_action_callback(callback);
    }

    fn deliver(&self, target: MirrorTarget, kind: MouseEventKind) -> bool {
        match deliver_mouse(&*self.backend, &self.choreography, target, kind) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to deliver {} to pid {}: {}", kind, target.window.pid, e);
                false
            }
        }
    }

    fn post(&self, handle: WindowHandle, event: &InputEvent) -> bool {
        match self.backend.post_input(handle, event) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Failed to post input to pid {}: {}", handle.pid, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Rect, TitleClassifier, DEFAULT_BRAND, WHEEL_DELTA};
    use crate::platform::mock::{
        create_test_monitor, create_test_popup, create_test_window, MockBackend, MockCapture,
    };
    use renmado_ipc::ContextMenuTiming;

    fn manager(backend: MockBackend) -> (Arc<MockBackend>, WindowManager<MockBackend>) {
        let backend = Arc::new(backend);
        let manager = WindowManager::with_classifier(
            backend.clone(),
            Box::new(MockCapture::new()),
            Arc::new(TitleClassifier::new(DEFAULT_BRAND)),
            MirrorOptions {
                context_menu: ContextMenuTiming {
                    settle_ms: 0,
                    restore_ms: 0,
                },
                ..MirrorOptions::default()
            },
        );
        (backend, manager)
    }

    fn browser() -> MockBackend {
        MockBackend::new().with_windows(vec![
            create_test_window(1, 100, "Master - Google Chrome", 0, 0, 1000, 800),
            create_test_popup(11, 100, "Wallet", 700, 40, 300, 400),
            create_test_window(2, 200, "Slave - Google Chrome", 1000, 0, 1000, 800),
            create_test_popup(21, 200, "Wallet", 1705, 45, 300, 400),
        ])
    }

    fn posted_key(backend: &MockBackend) -> KeyStroke {
        match backend.posted().last() {
            Some((_, InputEvent::Key(stroke))) => *stroke,
            other => panic!("Expected a key event, got {:?}", other),
        }
    }

    #[test]
    fn test_arrow_key_sets_extended_flag() {
        let (backend, manager) = manager(browser());
        assert!(manager.send_keyboard_event(100, 0x25, KeyEventKind::KeyDown));
        assert!(posted_key(&backend).extended);
    }

    #[test]
    fn test_letter_key_is_not_extended() {
        let (backend, manager) = manager(browser());
        assert!(manager.send_keyboard_event(100, 0x41, KeyEventKind::KeyDown));
        let stroke = posted_key(&backend);
        assert!(!stroke.extended);
        assert_eq!(stroke.kind, KeyEventKind::KeyDown);
    }

    #[test]
    fn test_input_to_unknown_pid_is_a_no_op() {
        let (backend, manager) = manager(browser());
        assert!(!manager.send_keyboard_event(999, 0x41, KeyEventKind::KeyDown));
        assert!(!manager.send_mouse_event(999, 1, 1, MouseEventKind::MouseDown));
        assert!(!manager.send_wheel_event(999, 0, WHEEL_DELTA));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_window_bounds() {
        let (_, manager) = manager(browser());
        assert_eq!(
            manager.get_window_bounds(200),
            WindowBounds {
                x: 1000,
                y: 0,
                width: 1000,
                height: 800,
                success: true
            }
        );
        assert_eq!(manager.get_window_bounds(999), WindowBounds::default());
    }

    #[test]
    fn test_list_windows() {
        let (_, manager) = manager(browser());
        let set = manager.list_windows(100);
        assert_eq!(set.main.as_ref().map(|w| w.handle.id), Some(1));
        assert_eq!(set.extensions.len(), 1);
    }

    #[test]
    fn test_monitors_secondary_first() {
        let (_, manager) = manager(browser().with_monitors(vec![
            create_test_monitor(0, 0, 1920, 1080, true),
            create_test_monitor(1920, 0, 2560, 1440, false),
        ]));
        let monitors = manager.get_monitors().unwrap();
        assert!(!monitors[0].is_primary);
        assert_eq!(monitors[0].index, 0);
        assert!(monitors[1].is_primary);
        assert_eq!(monitors[1].index, 1);
    }

    #[test]
    fn test_popup_matching_delivers_to_slave_popup() {
        let (backend, manager) = manager(browser());
        assert!(manager.send_mouse_event_with_popup_matching(
            100,
            200,
            720,
            60,
            MouseEventKind::MouseDown
        ));
        assert_eq!(
            backend.posted(),
            vec![(
                WindowHandle::new(21, 200),
                InputEvent::Mouse {
                    point: Point::new(1725, 65),
                    kind: MouseEventKind::MouseDown
                }
            )]
        );
    }

    #[test]
    fn test_popup_matching_outside_popup_is_proportional() {
        let (backend, manager) = manager(browser());
        assert!(manager.send_mouse_event_with_popup_matching(
            100,
            200,
            100,
            200,
            MouseEventKind::RightDown
        ));
        let posted = backend.posted();
        assert_eq!(posted.len(), 1);
        assert_eq!(posted[0].0, WindowHandle::new(2, 200));
        assert_eq!(
            posted[0].1,
            InputEvent::Mouse {
                point: Point::new(1100, 200),
                kind: MouseEventKind::RightDown
            }
        );
    }

    #[test]
    fn test_wheel_uses_cursor_position() {
        let (backend, manager) = manager(browser().with_cursor(Point::new(33, 44)));
        assert!(manager.send_wheel_event(100, 0, -WHEEL_DELTA));
        assert_eq!(
            backend.posted()[0].1,
            InputEvent::Wheel {
                point: Point::new(33, 44),
                delta_x: 0,
                delta_y: -120
            }
        );
    }

    #[test]
    fn test_wheel_falls_back_to_window_center() {
        let (backend, manager) = manager(browser().with_failing("cursor_position"));
        assert!(manager.send_wheel_event(200, 0, WHEEL_DELTA));
        match backend.posted()[0].1 {
            InputEvent::Wheel { point, .. } => {
                assert_eq!(point, Rect::new(1000, 0, 1000, 800).center())
            }
            ref other => panic!("Unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_is_process_window_active() {
        let (_, manager) = manager(browser().with_foreground(Some(WindowHandle::new(11, 100))));
        assert!(manager.is_process_window_active(100));
        assert!(!manager.is_process_window_active(200));
    }

    #[test]
    fn test_group_control_roundtrip() {
        let (_, manager) = manager(browser().with_foreground(Some(WindowHandle::new(1, 100))));
        let status = manager.start_group_control(100, &[200], None).unwrap();
        assert!(status.is_started());
        assert_eq!(manager.group_status().master_pid, Some(100));
        assert!(manager.uninstall_hooks());
        assert!(!manager.group_status().is_active);
    }
}
