use super::Rect;
use crate::error::Error;

/// One physical display. `frame` is the usable area (taskbar/menu bar excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    pub frame: Rect,
    pub is_primary: bool,
}

impl Monitor {
    pub fn new(frame: Rect, is_primary: bool) -> Self {
        Self {
            index: 0,
            frame,
            is_primary,
        }
    }

    pub fn to_ipc(&self) -> renmado_ipc::MonitorInfo {
        renmado_ipc::MonitorInfo {
            index: self.index,
            x: self.frame.x,
            y: self.frame.y,
            width: self.frame.width,
            height: self.frame.height,
            is_primary: self.is_primary,
        }
    }
}

/// Order monitors secondary-first (OS order kept within each group) and assign indices.
pub fn order_monitors(mut monitors: Vec<Monitor>) -> Vec<Monitor> {
    monitors.sort_by_key(|m| m.is_primary);
    for (index, monitor) in monitors.iter_mut().enumerate() {
        monitor.index = index;
    }
    monitors
}

pub fn select_monitor(monitors: &[Monitor], index: i32) -> Result<&Monitor, Error> {
    if monitors.is_empty() {
        return Err(Error::NoDisplay);
    }
    usize::try_from(index)
        .ok()
        .and_then(|i| monitors.get(i))
        .ok_or(Error::InvalidMonitor {
            index,
            count: monitors.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitors() -> Vec<Monitor> {
        vec![
            Monitor::new(Rect::new(0, 0, 1920, 1040), true),
            Monitor::new(Rect::new(1920, 0, 2560, 1400), false),
            Monitor::new(Rect::new(-1280, 0, 1280, 984), false),
        ]
    }

    #[test]
    fn test_order_monitors_secondary_first() {
        let ordered = order_monitors(monitors());
        assert_eq!(ordered.len(), 3);
        assert!(!ordered[0].is_primary);
        assert!(!ordered[1].is_primary);
        assert!(ordered[2].is_primary);
        // OS order preserved among secondaries
        assert_eq!(ordered[0].frame.x, 1920);
        assert_eq!(ordered[1].frame.x, -1280);
        for (i, m) in ordered.iter().enumerate() {
            assert_eq!(m.index, i);
        }
    }

    #[test]
    fn test_select_monitor() {
        let ordered = order_monitors(monitors());
        assert_eq!(select_monitor(&ordered, 2).unwrap().index, 2);
        assert!(matches!(
            select_monitor(&ordered, 3),
            Err(Error::InvalidMonitor { index: 3, count: 3 })
        ));
        assert!(matches!(
            select_monitor(&ordered, -1),
            Err(Error::InvalidMonitor { .. })
        ));
    }

    #[test]
    fn test_select_monitor_without_displays() {
        assert!(matches!(select_monitor(&[], 0), Err(Error::NoDisplay)));
    }
}
