use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Pointer event accepted by `send_mouse_event` and friends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseEventKind {
    MouseMove,
    MouseDown,
    MouseUp,
    RightDown,
    RightUp,
}

impl MouseEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseEventKind::MouseMove => "mousemove",
            MouseEventKind::MouseDown => "mousedown",
            MouseEventKind::MouseUp => "mouseup",
            MouseEventKind::RightDown => "rightdown",
            MouseEventKind::RightUp => "rightup",
        }
    }

    pub fn is_right_button(&self) -> bool {
        matches!(self, MouseEventKind::RightDown | MouseEventKind::RightUp)
    }

    pub fn is_left_button(&self) -> bool {
        matches!(self, MouseEventKind::MouseDown | MouseEventKind::MouseUp)
    }

    pub fn is_press(&self) -> bool {
        matches!(self, MouseEventKind::MouseDown | MouseEventKind::RightDown)
    }
}

impl FromStr for MouseEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mousemove" => Ok(MouseEventKind::MouseMove),
            "mousedown" => Ok(MouseEventKind::MouseDown),
            "mouseup" => Ok(MouseEventKind::MouseUp),
            "rightdown" => Ok(MouseEventKind::RightDown),
            "rightup" => Ok(MouseEventKind::RightUp),
            _ => Err(format!(
                "Unknown mouse event: {} (use mousemove, mousedown, mouseup, rightdown, rightup)",
                s
            )),
        }
    }
}

impl fmt::Display for MouseEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
}

impl KeyEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyEventKind::KeyDown => "keydown",
            KeyEventKind::KeyUp => "keyup",
        }
    }
}

impl FromStr for KeyEventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keydown" => Ok(KeyEventKind::KeyDown),
            "keyup" => Ok(KeyEventKind::KeyUp),
            _ => Err(format!("Unknown key event: {} (use keydown or keyup)", s)),
        }
    }
}

impl fmt::Display for KeyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification raised towards the embedding application when input is mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ControlAction {
    MouseClickAction,
    MouseWheelAction,
}

impl ControlAction {
    pub const ALL: [ControlAction; 2] =
        [ControlAction::MouseClickAction, ControlAction::MouseWheelAction];

    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::MouseClickAction => "mouse-click-action",
            ControlAction::MouseWheelAction => "mouse-wheel-action",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ControlAction::MouseClickAction => 0,
            ControlAction::MouseWheelAction => 1,
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
