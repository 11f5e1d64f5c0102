use super::{Point, Rect, Window, WindowHandle};

/// Where a mirrored pointer event lands on a slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorTarget {
    pub window: WindowHandle,
    /// Screen coordinates.
    pub point: Point,
}

/// Pick the slave popup whose offset from its main window is closest (Manhattan
/// distance) to the master popup's offset from the master main window.
/// Ties resolve to the earliest candidate.
pub fn match_popup<'a>(
    master_main: &Rect,
    master_popup: &Rect,
    slave_main: &Rect,
    slave_popups: &'a [Window],
) -> Option<&'a Window> {
    let (rel_x, rel_y) = master_popup.offset_from(master_main);

    slave_popups.iter().min_by_key(|popup| {
        let (x, y) = popup.frame.offset_from(slave_main);
        (x - rel_x).unsigned_abs() as u64 + (y - rel_y).unsigned_abs() as u64
    })
}

/// Map `point` from master space to slave space.
///
/// With both popups given, the point keeps its offset from the popup origin.
/// Otherwise it keeps its fractional position inside the main windows.
pub fn translate_point(
    master_main: &Rect,
    master_popup: Option<&Rect>,
    slave_main: &Rect,
    slave_popup: Option<&Rect>,
    point: Point,
) -> Point {
    if let (Some(master_popup), Some(slave_popup)) = (master_popup, slave_popup) {
        return Point::new(
            slave_popup.x + (point.x - master_popup.x),
            slave_popup.y + (point.y - master_popup.y),
        );
    }

    Point::new(
        scale_axis(point.x, master_main.x, master_main.width, slave_main.x, slave_main.width),
        scale_axis(point.y, master_main.y, master_main.height, slave_main.y, slave_main.height),
    )
}

fn scale_axis(value: i32, from_origin: i32, from_len: u32, to_origin: i32, to_len: u32) -> i32 {
    if from_len == 0 {
        return to_origin;
    }
    let fraction = (value - from_origin) as f64 / from_len as f64;
    to_origin + (fraction * to_len as f64).round() as i32
}

/// Resolve the slave window and point for a pointer event at `point` on the master.
/// Falls back to the slave main window when no slave popup matches.
pub fn resolve_target(
    master_main: &Window,
    master_popup: Option<&Window>,
    slave_main: &Window,
    slave_popups: &[Window],
    point: Point,
) -> MirrorTarget {
    if let Some(master_popup) = master_popup {
        if let Some(slave_popup) = match_popup(
            &master_main.frame,
            &master_popup.frame,
            &slave_main.frame,
            slave_popups,
        ) {
            return MirrorTarget {
                window: slave_popup.handle,
                point: translate_point(
                    &master_main.frame,
                    Some(&master_popup.frame),
                    &slave_main.frame,
                    Some(&slave_popup.frame),
                    point,
                ),
            };
        }
    }

    MirrorTarget {
        window: slave_main.handle,
        point: translate_point(&master_main.frame, None, &slave_main.frame, None, point),
    }
}
