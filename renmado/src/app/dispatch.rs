use renmado_ipc::{Command, ControlEvent, Response};

use crate::core::{LayoutRequest, Monitor};
use crate::ipc::EventBroadcaster;
use crate::manager::WindowManager;
use crate::platform::PlatformWindowBackend;

/// Runs one IPC command against the manager and publishes the session
/// lifecycle events it causes.
pub fn dispatch_command<B: PlatformWindowBackend + ?Sized + 'static>(
    cmd: Command,
    manager: &WindowManager<B>,
    events: &EventBroadcaster,
) -> Response {
    match cmd {
        Command::GetMonitors => match manager.get_monitors() {
            Ok(monitors) => Response::Monitors {
                monitors: monitors.iter().map(Monitor::to_ipc).collect(),
            },
            Err(e) => e.into(),
        },
        Command::ArrangeWindows {
            main_pid,
            child_pids,
            columns,
            size,
            spacing,
            monitor_index,
        } => {
            let request = LayoutRequest {
                main_pid,
                child_pids,
                columns,
                cell_size: size,
                spacing,
                monitor_index,
            };
            match manager.arrange_windows(&request) {
                Ok(report) => Response::Arranged { report },
                Err(e) => e.into(),
            }
        }
        Command::GetWindowBounds { pid } => Response::Bounds {
            bounds: manager.get_window_bounds(pid),
        },
        Command::ListWindows { pid } => Response::Windows {
            windows: manager.list_windows(pid).to_ipc(),
        },
        Command::IsProcessWindowActive { pid } => Response::Active {
            active: manager.is_process_window_active(pid),
        },
        Command::SendMouseEvent { pid, x, y, event } => Response::Delivered {
            success: manager.send_mouse_event(pid, x, y, event),
        },
        Command::SendMouseEventWithPopupMatching {
            master_pid,
            slave_pid,
            x,
            y,
            event,
        } => Response::Delivered {
            success: manager.send_mouse_event_with_popup_matching(
                master_pid, slave_pid, x, y, event,
            ),
        },
        Command::SendKeyboardEvent {
            pid,
            key_code,
            event,
        } => Response::Delivered {
            success: manager.send_keyboard_event(pid, key_code, event),
        },
        Command::SendWheelEvent {
            pid,
            delta_x,
            delta_y,
        } => Response::Delivered {
            success: manager.send_wheel_event(pid, delta_x, delta_y),
        },
        Command::StartGroupControl {
            master_pid,
            slave_pids,
            options,
        } => {
            // Any running session is torn down by the start, whatever its outcome
            let was_active = manager.group_status().is_active;
            let result = manager.start_group_control(master_pid, &slave_pids, options);
            if was_active {
                events.send(ControlEvent::SessionStopped);
            }
            match result {
                Ok(status) => {
                    if status.is_started() {
                        events.send(ControlEvent::SessionStarted {
                            master_pid,
                            slave_pids: manager.group_status().slave_pids,
                        });
                    }
                    Response::GroupControl {
                        status: status.to_string(),
                    }
                }
                Err(e) => e.into(),
            }
        }
        Command::UninstallHooks => {
            if manager.uninstall_hooks() {
                events.send(ControlEvent::SessionStopped);
            }
            Response::Ok
        }
        Command::GetGroupStatus => Response::GroupStatus {
            status: manager.group_status(),
        },
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}
