pub mod headless_mode;
pub mod messages;
pub mod setup;
pub mod tui_mode;

pub use headless_mode::{print_section, run_headless_mode};
pub use setup::{SessionData, resolve_server_url, setup_session};
pub use tui_mode::run_tui_mode;
