//! Modular dashboard implementation
//!
//! Split into logical modules for better maintainability

pub mod components;
pub mod prompt;
pub mod renderer;
pub mod state;
pub mod updaters;
pub mod utils;

// Re-export main types and functions for external use
pub use prompt::{Prompt, PromptKind};
pub use renderer::render_dashboard;
pub use state::DashboardState;
