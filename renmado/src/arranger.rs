use renmado_ipc::ArrangeReport;

use crate::core::{
    compute_layout, discover, order_monitors, select_monitor, LayoutRequest, Rect,
    WindowClassifier, WindowHandle,
};
use crate::error::Error;
use crate::platform::{PlatformWindowBackend, WindowManipulator};

/// Apply `rect` to one window, best effort. Every step is attempted even when
/// an earlier one fails; returns whether all of them succeeded.
pub fn apply<M: WindowManipulator + ?Sized>(
    m: &M,
    handle: WindowHandle,
    rect: Rect,
    preserve_size: bool,
) -> bool {
    let mut ok = true;
    let mut step = |name: &str, result: Result<(), Error>| {
        if let Err(e) = result {
            tracing::warn!(
                "{} failed for window {} (pid {}): {}",
                name,
                handle.id,
                handle.pid,
                e
            );
            ok = false;
        }
    };

    step("Restore", m.restore_if_minimized(handle));
    step("Bring to front", m.bring_to_front(handle));
    step("Clear maximized", m.clear_maximized(handle));
    step("Set frame", m.apply_rect(handle, rect, preserve_size));
    // Raise above everything, then drop the pin so the window stays in normal z-order.
    step("Set topmost", m.set_topmost(handle, true));
    step("Clear topmost", m.set_topmost(handle, false));

    if ok {
        tracing::debug!(
            "Arranged window {} (pid {}) at ({}, {}) {}x{}{}",
            handle.id,
            handle.pid,
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            if preserve_size { " (size kept)" } else { "" }
        );
    }
    ok
}

/// Lay out the main process and its children on the requested monitor.
///
/// Input is validated and the layout fully computed before any window is touched.
pub fn arrange<B: PlatformWindowBackend + ?Sized>(
    backend: &B,
    classifier: &dyn WindowClassifier,
    request: &LayoutRequest,
) -> Result<ArrangeReport, Error> {
    request.validate()?;
    let monitors = order_monitors(backend.enumerate_monitors()?);
    let monitor = select_monitor(&monitors, request.monitor_index)?;
    let layout = compute_layout(request, monitor)?;

    tracing::info!(
        "Arranging {} windows in {}x{} grid on monitor {}",
        layout.cells.len(),
        layout.columns,
        layout.rows,
        monitor.index
    );

    let mut report = ArrangeReport::default();
    let mut record = |ok: bool| {
        if ok {
            report.arranged += 1;
        } else {
            report.failed += 1;
        }
    };

    let mut skipped = Vec::new();
    for cell in &layout.cells {
        let set = discover(backend, classifier, cell.pid);
        let Some(main) = set.main else {
            tracing::info!("No main window for pid {}, skipping", cell.pid);
            skipped.push(cell.pid);
            continue;
        };

        record(apply(backend, main.handle, cell.rect, false));

        for ext in &set.extensions {
            let pinned = layout.pin_satellite(cell, &ext.frame);
            let rect = Rect::new(pinned.x, pinned.y, ext.frame.width, ext.frame.height);
            record(apply(backend, ext.handle, rect, true));
        }
    }

    report.skipped_pids = skipped;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{TitleClassifier, DEFAULT_BRAND};
    use crate::platform::mock::{
        create_test_monitor, create_test_popup, create_test_window, MockBackend, MockCall,
    };
    use renmado_ipc::CellSize;

    fn request(main_pid: i32, child_pids: Vec<i32>, monitor_index: i32) -> LayoutRequest {
        LayoutRequest {
            main_pid,
            child_pids,
            columns: 2,
            cell_size: CellSize::auto(),
            spacing: 10,
            monitor_index,
        }
    }

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_monitors(vec![create_test_monitor(0, 0, 1000, 800, true)])
            .with_windows(vec![
                create_test_window(1, 100, "Main - Google Chrome", 300, 300, 640, 480),
                create_test_window(2, 200, "A - Google Chrome", 50, 50, 640, 480),
                create_test_popup(3, 200, "Wallet", 400, 90, 360, 600),
                create_test_window(4, 300, "B - Google Chrome", 0, 0, 640, 480),
            ])
    }

    #[test]
    fn test_arrange_places_mains_and_pins_extensions() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let report = arrange(&backend, &classifier, &request(100, vec![200, 300], 0)).unwrap();
        assert_eq!(report.arranged, 4);
        assert_eq!(report.failed, 0);
        assert!(report.skipped_pids.is_empty());

        assert_eq!(backend.frame_of(1), Some(Rect::new(10, 10, 465, 365)));
        assert_eq!(backend.frame_of(2), Some(Rect::new(505, 10, 475, 375)));
        assert_eq!(backend.frame_of(4), Some(Rect::new(10, 405, 475, 375)));
        // 505 + 485 - 360 - 10, size untouched
        assert_eq!(backend.frame_of(3), Some(Rect::new(620, 10, 360, 600)));
    }

    #[test]
    fn test_topmost_is_set_then_cleared() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        arrange(&backend, &classifier, &request(100, vec![], 0)).unwrap();

        let topmost: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, MockCall::Topmost { .. }))
            .collect();
        assert_eq!(
            topmost,
            vec![
                MockCall::Topmost {
                    id: 1,
                    topmost: true
                },
                MockCall::Topmost {
                    id: 1,
                    topmost: false
                },
            ]
        );
    }

    #[test]
    fn test_invalid_monitor_touches_nothing() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let result = arrange(&backend, &classifier, &request(100, vec![200], 1));
        assert!(matches!(
            result,
            Err(Error::InvalidMonitor { index: 1, count: 1 })
        ));
        assert!(backend.calls().is_empty());
        assert_eq!(backend.frame_of(1), Some(Rect::new(300, 300, 640, 480)));

        let result = arrange(&backend, &classifier, &request(100, vec![200], -1));
        assert!(matches!(result, Err(Error::InvalidMonitor { .. })));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_no_display_touches_nothing() {
        let backend = MockBackend::new().with_windows(vec![create_test_window(
            1,
            100,
            "Main - Google Chrome",
            0,
            0,
            640,
            480,
        )]);
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let result = arrange(&backend, &classifier, &request(100, vec![], 0));
        assert!(matches!(result, Err(Error::NoDisplay)));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_zero_columns_touches_nothing() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        let mut req = request(100, vec![200], 0);
        req.columns = 0;

        assert!(matches!(
            arrange(&backend, &classifier, &req),
            Err(Error::InvalidArgument(_))
        ));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_oversized_grid_touches_nothing() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);
        let mut req = request(100, vec![200], 0);
        req.columns = 50_000;
        req.spacing = 50_000;

        assert!(matches!(
            arrange(&backend, &classifier, &req),
            Err(Error::InvalidArgument(_))
        ));
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_missing_main_window_is_skipped() {
        let backend = backend();
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let report = arrange(&backend, &classifier, &request(100, vec![999, 300], 0)).unwrap();
        assert_eq!(report.skipped_pids, vec![999]);
        assert_eq!(report.arranged, 2);
        // pid 300 keeps its own cell even though 999 was skipped
        assert_eq!(backend.frame_of(4), Some(Rect::new(10, 405, 475, 375)));
    }

    #[test]
    fn test_failed_step_is_reported_and_arrangement_continues() {
        let backend = backend().with_failing("clear_maximized");
        let classifier = TitleClassifier::new(DEFAULT_BRAND);

        let report = arrange(&backend, &classifier, &request(100, vec![300], 0)).unwrap();
        assert_eq!(report.arranged, 0);
        assert_eq!(report.failed, 2);
        // Two cells in two columns is a single row spanning the full height
        assert_eq!(backend.frame_of(1), Some(Rect::new(10, 10, 465, 760)));
        assert_eq!(backend.frame_of(4), Some(Rect::new(505, 10, 475, 770)));
    }
}
