//! View synchronization engine: sections, widgets and the renderer that keeps
//! them in step with the server.

pub mod builders;
pub mod format;
pub mod interactions;
pub mod registry;
pub mod renderer;
pub mod scheduler;
pub mod section;
pub mod widget;

pub use builders::ItemRenderError;
pub use interactions::{Command, Interaction, InteractionCategory, TradeSide};
pub use registry::WidgetRegistry;
pub use renderer::{ImpactToggle, Renderer, RendererConfig};
pub use scheduler::{Completion, Scheduler};
pub use section::{Notice, RefreshOutcome, RefreshTicket, Section, SectionSlot, SectionState};
pub use widget::{Widget, WidgetBody, WidgetKind};
