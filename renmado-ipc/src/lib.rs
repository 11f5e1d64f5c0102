pub mod command;
pub mod event;
pub mod input;
pub mod options;

pub use command::{
    ArrangeReport, Command, ErrorKind, GroupStatus, MonitorInfo, Response, WindowBounds,
    WindowInfo,
};
pub use event::{ControlEvent, EventFilter, SubscribeRequest};
pub use input::{ControlAction, KeyEventKind, MouseEventKind};
pub use options::{CellSize, ContextMenuTiming, MirrorOptions};
