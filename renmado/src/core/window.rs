pub type WindowId = u64;

/// Live reference to one top-level window. Only valid while the window exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle {
    pub id: WindowId,
    pub pid: i32,
}

impl WindowHandle {
    pub fn new(id: WindowId, pid: i32) -> Self {
        Self { id, pid }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowRole {
    Main,
    Extension,
}

/// Raw window snapshot as reported by the platform, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub frame: Rect,
    pub is_visible: bool,
    pub is_minimized: bool,
    /// Standard top-level window: overlapped style on Windows, AXStandardWindow on macOS.
    pub is_standard: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub handle: WindowHandle,
    pub title: String,
    pub frame: Rect,
    pub role: WindowRole,
}

impl Window {
    pub fn from_info(info: WindowInfo, role: WindowRole) -> Self {
        Self {
            handle: info.handle,
            title: info.title,
            frame: info.frame,
            role,
        }
    }

    pub fn pid(&self) -> i32 {
        self.handle.pid
    }

    pub fn is_extension(&self) -> bool {
        self.role == WindowRole::Extension
    }

    pub fn to_ipc(&self) -> renmado_ipc::WindowInfo {
        renmado_ipc::WindowInfo {
            id: self.handle.id,
            pid: self.handle.pid,
            title: self.title.clone(),
            x: self.frame.x,
            y: self.frame.y,
            width: self.frame.width,
            height: self.frame.height,
            is_extension: self.is_extension(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from edge coordinates, as Win32 RECTs are reported.
    pub fn from_edges(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0) as u32,
            height: (bottom - top).max(0) as u32,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Offset of this rect's top-left corner from `owner`'s top-left corner.
    pub fn offset_from(&self, owner: &Rect) -> (i32, i32) {
        (self.x - owner.x, self.y - owner.y)
    }
}
