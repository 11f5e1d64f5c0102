use serde::{Deserialize, Serialize};

/// Requested grid cell size. A zero dimension means "derive from the monitor".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSize {
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl CellSize {
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Parse `auto`, `800x600` or a single number applied to both dimensions.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Some(Self::auto());
        }
        match s.split_once(['x', 'X']) {
            Some((w, h)) => Some(Self::new(w.trim().parse().ok()?, h.trim().parse().ok()?)),
            None => s.parse().ok().map(|v| Self::new(v, v)),
        }
    }

    pub fn is_auto(&self) -> bool {
        self.width == 0 && self.height == 0
    }
}

impl std::fmt::Display for CellSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_auto() {
            write!(f, "auto")
        } else {
            write!(f, "{}x{}", self.width, self.height)
        }
    }
}

/// Cursor choreography timings used to trigger native context menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextMenuTiming {
    /// Wait after moving the cursor before the event is posted.
    pub settle_ms: u64,
    /// Wait after posting before the cursor is moved back.
    pub restore_ms: u64,
}

impl Default for ContextMenuTiming {
    fn default() -> Self {
        Self {
            settle_ms: 10,
            restore_ms: 50,
        }
    }
}

/// Per-session input mirroring options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorOptions {
    pub mouse: bool,
    pub keyboard: bool,
    pub wheel: bool,
    pub wheel_coalesce_ms: u64,
    pub key_dedup_ms: u64,
    pub ignore_clipboard_shortcuts: bool,
    pub queue_capacity: usize,
    pub context_menu: ContextMenuTiming,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            mouse: true,
            keyboard: true,
            wheel: true,
            wheel_coalesce_ms: 16,
            key_dedup_ms: 20,
            ignore_clipboard_shortcuts: true,
            queue_capacity: 256,
            context_menu: ContextMenuTiming::default(),
        }
    }
}
