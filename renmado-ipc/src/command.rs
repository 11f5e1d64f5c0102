use serde::{Deserialize, Serialize};

use crate::{CellSize, KeyEventKind, MirrorOptions, MouseEventKind};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Layout
    GetMonitors,
    ArrangeWindows {
        main_pid: i32,
        child_pids: Vec<i32>,
        columns: u32,
        #[serde(default)]
        size: CellSize,
        #[serde(default)]
        spacing: u32,
        #[serde(default)]
        monitor_index: i32,
    },

    // Queries
    GetWindowBounds { pid: i32 },
    ListWindows { pid: i32 },
    IsProcessWindowActive { pid: i32 },

    // Input delivery
    SendMouseEvent {
        pid: i32,
        x: i32,
        y: i32,
        event: MouseEventKind,
    },
    SendMouseEventWithPopupMatching {
        master_pid: i32,
        slave_pid: i32,
        x: i32,
        y: i32,
        event: MouseEventKind,
    },
    SendKeyboardEvent {
        pid: i32,
        key_code: u32,
        event: KeyEventKind,
    },
    SendWheelEvent {
        pid: i32,
        delta_x: i32,
        delta_y: i32,
    },

    // Group control
    StartGroupControl {
        master_pid: i32,
        slave_pids: Vec<i32>,
        #[serde(default)]
        options: Option<MirrorOptions>,
    },
    UninstallHooks,
    GetGroupStatus,

    // Control
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { kind: ErrorKind, message: String },
    Monitors { monitors: Vec<MonitorInfo> },
    Arranged { report: ArrangeReport },
    Bounds { bounds: WindowBounds },
    Windows { windows: Vec<WindowInfo> },
    Delivered { success: bool },
    Active { active: bool },
    GroupControl { status: String },
    GroupStatus { status: GroupStatus },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
    NoDisplay,
    InvalidMonitor,
    WindowNotFound,
    OsOperationFailed,
    PermissionDenied,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorInfo {
    pub index: usize,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: u64,
    pub pid: i32,
    pub title: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub is_extension: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrangeReport {
    /// Windows that had every step applied cleanly.
    pub arranged: usize,
    /// Windows where at least one step failed.
    pub failed: usize,
    /// Pids without a main window; nothing was moved for them.
    pub skipped_pids: Vec<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStatus {
    pub is_active: bool,
    pub master_pid: Option<i32>,
    pub slave_pids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_arrange_serialization() {
        let cmd = Command::ArrangeWindows {
            main_pid: 100,
            child_pids: vec![200, 300],
            columns: 2,
            size: CellSize::auto(),
            spacing: 10,
            monitor_index: 0,
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"arrange_windows\""));
        assert!(json.contains("\"child_pids\":[200,300]"));
    }

    #[test]
    fn test_command_arrange_optional_fields() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"arrange_windows","main_pid":1,"child_pids":[],"columns":3}"#,
        )
        .unwrap();
        match cmd {
            Command::ArrangeWindows {
                size,
                spacing,
                monitor_index,
                ..
            } => {
                assert!(size.is_auto());
                assert_eq!(spacing, 0);
                assert_eq!(monitor_index, 0);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_command_missing_positional_is_rejected() {
        let result = serde_json::from_str::<Command>(r#"{"type":"arrange_windows","main_pid":1}"#);
        assert!(result.is_err());

        let result = serde_json::from_str::<Command>(r#"{"type":"send_mouse_event","pid":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_command_send_mouse_event() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"send_mouse_event","pid":7,"x":10,"y":20,"event":"rightdown"}"#,
        )
        .unwrap();
        match cmd {
            Command::SendMouseEvent { pid, x, y, event } => {
                assert_eq!((pid, x, y), (7, 10, 20));
                assert_eq!(event, MouseEventKind::RightDown);
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_command_start_group_control_without_options() {
        let cmd: Command = serde_json::from_str(
            r#"{"type":"start_group_control","master_pid":1,"slave_pids":[2,3]}"#,
        )
        .unwrap();
        match cmd {
            Command::StartGroupControl {
                master_pid,
                slave_pids,
                options,
            } => {
                assert_eq!(master_pid, 1);
                assert_eq!(slave_pids, vec![2, 3]);
                assert!(options.is_none());
            }
            _ => panic!("Wrong variant"),
        }
    }

    #[test]
    fn test_response_error_serialization() {
        let resp = Response::error(ErrorKind::InvalidMonitor, "monitor index 3 out of range");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"kind\":\"invalid_monitor\""));
    }

    #[test]
    fn test_response_bounds_serialization() {
        let resp = Response::Bounds {
            bounds: WindowBounds::default(),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"width\":0"));
    }
}
