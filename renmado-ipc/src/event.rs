use serde::{Deserialize, Serialize};

use crate::ControlAction;

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to mirrored-input notifications
    #[serde(default)]
    pub control: bool,
    /// Subscribe to session lifecycle events (started, stopped)
    #[serde(default)]
    pub session: bool,
}

impl EventFilter {
    pub fn all() -> Self {
        Self {
            control: true,
            session: true,
        }
    }

    pub fn matches(&self, event: &ControlEvent) -> bool {
        match event {
            ControlEvent::ControlAction { .. } => self.control,
            ControlEvent::SessionStarted { .. } | ControlEvent::SessionStopped => self.session,
        }
    }

    pub fn any(&self) -> bool {
        self.control || self.session
    }
}

/// Request sent as the first line on the event socket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Event filter (if not set or all false, subscribes to all events)
    #[serde(default)]
    pub filter: EventFilter,
}

impl SubscribeRequest {
    pub fn effective_filter(&self) -> EventFilter {
        if self.filter.any() {
            self.filter.clone()
        } else {
            EventFilter::all()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlEvent {
    ControlAction { action: ControlAction },
    SessionStarted { master_pid: i32, slave_pids: Vec<i32> },
    SessionStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_event_serialization() {
        let event = ControlEvent::ControlAction {
            action: ControlAction::MouseWheelAction,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"control_action\""));
        assert!(json.contains("\"action\":\"mouse-wheel-action\""));
    }

    #[test]
    fn test_empty_filter_subscribes_to_everything() {
        let request = SubscribeRequest::default();
        let filter = request.effective_filter();
        assert!(filter.matches(&ControlEvent::SessionStopped));
        assert!(filter.matches(&ControlEvent::ControlAction {
            action: ControlAction::MouseClickAction
        }));
    }

    #[test]
    fn test_filter_control_only() {
        let request: SubscribeRequest =
            serde_json::from_str(r#"{"filter":{"control":true}}"#).unwrap();
        let filter = request.effective_filter();
        assert!(!filter.matches(&ControlEvent::SessionStopped));
        assert!(filter.matches(&ControlEvent::ControlAction {
            action: ControlAction::MouseClickAction
        }));
    }
}
