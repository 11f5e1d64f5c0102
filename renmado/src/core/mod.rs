mod classifier;
mod config;
mod discovery;
mod grid;
mod input;
mod monitor;
mod popup;
mod window;

pub use classifier::*;
pub use config::*;
pub use discovery::*;
pub use grid::*;
pub use input::*;
pub use monitor::*;
pub use popup::*;
pub use window::*;
