pub mod app;
pub mod components;
pub mod state;
pub mod timers;

pub use app::TerminalApp;
pub use state::{Notice, NoticeKind, ViewState};
