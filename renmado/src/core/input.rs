use std::time::{Duration, Instant};

use renmado_ipc::{KeyEventKind, MouseEventKind};

use super::Point;

/// One wheel notch, in the unit every wheel delta is carried in.
pub const WHEEL_DELTA: i32 = 120;

/// Virtual key codes that need the extended-key bit to be interpreted like
/// the dedicated navigation/editing keys rather than their numpad twins.
const EXTENDED_KEYS: &[u32] = &[
    0x2D, // VK_INSERT
    0x2E, // VK_DELETE
    0x24, // VK_HOME
    0x23, // VK_END
    0x21, // VK_PRIOR
    0x22, // VK_NEXT
    0x25, // VK_LEFT
    0x26, // VK_UP
    0x27, // VK_RIGHT
    0x28, // VK_DOWN
    0x90, // VK_NUMLOCK
    0x6F, // VK_DIVIDE
];

pub fn is_extended_key(key_code: u32) -> bool {
    EXTENDED_KEYS.contains(&key_code)
}

/// A key transition ready to be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub code: u32,
    pub kind: KeyEventKind,
    pub extended: bool,
}

impl KeyStroke {
    pub fn new(code: u32, kind: KeyEventKind) -> Self {
        Self {
            code,
            kind,
            extended: is_extended_key(code),
        }
    }

    /// Keystroke flags word as carried by WM_KEYDOWN/WM_KEYUP:
    /// repeat count, scan code, extended bit, previous state and transition bits.
    pub fn message_lparam(&self, scan_code: u32) -> isize {
        let mut lparam: u32 = 1 | ((scan_code & 0xFF) << 16);
        if self.extended {
            lparam |= 1 << 24;
        }
        if self.kind == KeyEventKind::KeyUp {
            lparam |= (1 << 30) | (1 << 31);
        }
        lparam as i32 as isize
    }
}

/// Pack client coordinates the way mouse messages expect them.
pub fn mouse_lparam(x: i32, y: i32) -> isize {
    (((y as u32 & 0xFFFF) << 16) | (x as u32 & 0xFFFF)) as i32 as isize
}

/// Wheel delta in the high word, no button state.
pub fn wheel_wparam(delta: i32) -> usize {
    ((delta as u32 & 0xFFFF) << 16) as usize
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

#[cfg(target_os = "macos")]
const COPY_KEY: u32 = 0x08; // kVK_ANSI_C
#[cfg(target_os = "macos")]
const CUT_KEY: u32 = 0x07; // kVK_ANSI_X
#[cfg(not(target_os = "macos"))]
const COPY_KEY: u32 = 0x43; // 'C'
#[cfg(not(target_os = "macos"))]
const CUT_KEY: u32 = 0x58; // 'X'

/// Copy/cut chords, which are never mirrored when clipboard filtering is on.
pub fn is_clipboard_shortcut(key_code: u32, modifiers: Modifiers) -> bool {
    let chord = if cfg!(target_os = "macos") {
        modifiers.meta
    } else {
        modifiers.ctrl
    };
    chord && (key_code == COPY_KEY || key_code == CUT_KEY)
}

/// Drops an identical key transition repeated inside `window`.
#[derive(Debug)]
pub struct KeyDeduplicator {
    window: Duration,
    last: Option<(u32, KeyEventKind, Instant)>,
}

impl KeyDeduplicator {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, code: u32, kind: KeyEventKind) -> bool {
        self.accept_at(code, kind, Instant::now())
    }

    pub fn accept_at(&mut self, code: u32, kind: KeyEventKind, now: Instant) -> bool {
        if let Some((last_code, last_kind, at)) = self.last {
            if last_code == code
                && last_kind == kind
                && now.saturating_duration_since(at) < self.window
            {
                return false;
            }
        }
        self.last = Some((code, kind, now));
        true
    }
}

/// Input delivered to one target window. Points are screen coordinates;
/// backends convert to client space where the OS needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Mouse { point: Point, kind: MouseEventKind },
    Key(KeyStroke),
    Wheel { point: Point, delta_x: i32, delta_y: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_keys() {
        assert!(KeyStroke::new(0x25, KeyEventKind::KeyDown).extended);
        assert!(KeyStroke::new(0x2E, KeyEventKind::KeyDown).extended);
        assert!(KeyStroke::new(0x6F, KeyEventKind::KeyUp).extended);
        assert!(!KeyStroke::new(0x41, KeyEventKind::KeyDown).extended);
        assert!(!KeyStroke::new(0x0D, KeyEventKind::KeyDown).extended);
    }

    #[test]
    fn test_key_lparam_bits() {
        let down = KeyStroke::new(0x41, KeyEventKind::KeyDown).message_lparam(0x1E);
        assert_eq!(down, 0x001E_0001);

        let up = KeyStroke::new(0x25, KeyEventKind::KeyUp).message_lparam(0x4B);
        let bits = up as u32;
        assert_eq!(bits & 0xFFFF, 1);
        assert_eq!((bits >> 16) & 0xFF, 0x4B);
        assert_ne!(bits & (1 << 24), 0);
        assert_ne!(bits & (1 << 30), 0);
        assert_ne!(bits & (1 << 31), 0);
    }

    #[test]
    fn test_mouse_lparam_packs_negative_coordinates() {
        assert_eq!(mouse_lparam(10, 20), (20 << 16) | 10);
        let packed = mouse_lparam(-1, 5) as u32;
        assert_eq!(packed & 0xFFFF, 0xFFFF);
        assert_eq!(packed >> 16, 5);
    }

    #[test]
    fn test_wheel_wparam() {
        assert_eq!(wheel_wparam(WHEEL_DELTA) >> 16, 120);
        assert_eq!((wheel_wparam(-WHEEL_DELTA) >> 16) as u16 as i16, -120);
    }

    #[test]
    fn test_clipboard_shortcuts() {
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
        assert!(is_clipboard_shortcut(COPY_KEY, chord));
        assert!(is_clipboard_shortcut(CUT_KEY, chord));
        assert!(!is_clipboard_shortcut(COPY_KEY, Modifiers::default()));
        assert!(!is_clipboard_shortcut(0x56, chord));
    }

    #[test]
    fn test_key_dedup_window() {
        let mut dedup = KeyDeduplicator::new(Duration::from_millis(20));
        let t0 = Instant::now();

        assert!(dedup.accept_at(0x41, KeyEventKind::KeyDown, t0));
        assert!(!dedup.accept_at(0x41, KeyEventKind::KeyDown, t0 + Duration::from_millis(5)));
        assert!(dedup.accept_at(0x41, KeyEventKind::KeyUp, t0 + Duration::from_millis(6)));
        assert!(dedup.accept_at(0x41, KeyEventKind::KeyDown, t0 + Duration::from_millis(40)));
        assert!(dedup.accept_at(0x42, KeyEventKind::KeyDown, t0 + Duration::from_millis(41)));
    }
}
