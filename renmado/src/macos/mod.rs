mod accessibility;
mod backend;
mod display;
mod event_tap;

pub use accessibility::{is_trusted, is_trusted_with_prompt};
pub use backend::MacBackend;
pub use event_tap::MacCapture;

/// Written into `EVENT_SOURCE_USER_DATA` of every event we post ("RNMD").
pub(crate) const SYNTHETIC_EVENT_MARKER: i64 = 0x524E_4D44;
