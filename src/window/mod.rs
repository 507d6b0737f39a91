//! Windows, their configuration and the events they deliver.

mod builder;
mod callbacks;
mod dispatch;
mod state;
mod wnd;

pub use builder::Builder;
pub use state::Lifecycle;
pub use wnd::Window;
