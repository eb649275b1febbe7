//! Main application state and UI loop
//!
//! Contains the App struct and main UI event handling logic

use crate::environment::Environment;
use crate::events::Event as EngineEvent;
use crate::sync::{
    Command, ImpactToggle, Interaction, InteractionCategory, Renderer, Section, TradeSide,
};
use crate::ui::dashboard::{DashboardState, PromptKind, render_dashboard};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{Terminal, backend::Backend};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, mpsc};

/// UI configuration data grouped by concern
#[derive(Debug, Clone)]
pub struct UIConfig {
    pub with_background_color: bool,
}

impl UIConfig {
    pub fn new(with_background_color: bool) -> Self {
        Self {
            with_background_color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Application state
pub struct App {
    /// The engine. Only this loop touches it.
    renderer: Renderer,

    state: DashboardState,

    /// Receives activity events from the renderer.
    event_receiver: mpsc::Receiver<EngineEvent>,

    /// Broadcasts the shutdown signal.
    shutdown_sender: broadcast::Sender<()>,
}

impl App {
    pub fn new(
        renderer: Renderer,
        environment: Environment,
        server_url: String,
        sections: Vec<Section>,
        event_receiver: mpsc::Receiver<EngineEvent>,
        shutdown_sender: broadcast::Sender<()>,
        ui_config: UIConfig,
    ) -> Self {
        let state = DashboardState::new(
            environment,
            server_url,
            sections,
            Instant::now(),
            ui_config,
        );
        Self {
            renderer,
            state,
            event_receiver,
            shutdown_sender,
        }
    }

    /// First refresh of every tab, then the periodic timers.
    fn start(&mut self) {
        let sections = self.state.sections.clone();
        for section in &sections {
            self.renderer.refresh(*section);
        }
        self.renderer.start_periodic(&sections);
    }

    fn widget_count(&self) -> usize {
        self.renderer.widgets(self.state.current_section()).len()
    }

    fn selected_widget_id(&self) -> Option<String> {
        self.renderer
            .widgets(self.state.current_section())
            .get(self.state.selected)
            .map(|widget| widget.id.clone())
    }

    fn handle_key(&mut self, code: KeyCode) -> Flow {
        if self.state.prompt.is_some() {
            self.handle_prompt_key(code);
            return Flow::Continue;
        }

        let section = self.state.current_section();
        match code {
            KeyCode::Esc | KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Right | KeyCode::Tab => self.state.next_section(),
            KeyCode::Left | KeyCode::BackTab => self.state.previous_section(),
            KeyCode::Down | KeyCode::Char('j') => self.state.select_next(self.widget_count()),
            KeyCode::Up | KeyCode::Char('k') => self.state.select_previous(),
            KeyCode::Char('r') => {
                self.renderer.refresh(section);
            }
            KeyCode::Char('R') => {
                for section in self.state.sections.clone() {
                    self.renderer.refresh(section);
                }
            }
            KeyCode::Char('p') => {
                if self.renderer.has_timer(section) {
                    self.renderer.stop_section(section);
                    self.state.set_status(format!("{} timer paused", section.title()));
                } else {
                    self.renderer.start_periodic(&[section]);
                    self.state.set_status(format!("{} timer resumed", section.title()));
                }
            }
            KeyCode::Enter | KeyCode::Char('t') => self.interact(InteractionCategory::TradeActions),
            KeyCode::Char('i') => self.interact(InteractionCategory::ImpactToggle),
            KeyCode::Char('f') => self.interact(InteractionCategory::Feedback),
            KeyCode::Char('s') => self.interact(InteractionCategory::HoldingActions),
            KeyCode::Char('x') => self.confirm_remove(),
            _ => {}
        }
        Flow::Continue
    }

    fn interact(&mut self, category: InteractionCategory) {
        let section = self.state.current_section();
        if !section.interaction_categories().contains(&category) {
            return;
        }
        let Some(widget_id) = self.selected_widget_id() else {
            return;
        };
        let commands = self.renderer.dispatch(&Interaction {
            category,
            section,
            widget_id,
        });
        if commands.is_empty() {
            self.state.set_status("Nothing to do for this item");
        }
        for command in commands {
            self.run_command(command);
        }
    }

    fn run_command(&mut self, command: Command) {
        match command {
            Command::PromptTrade { side, symbol } => {
                if side == TradeSide::Sell {
                    self.renderer.request_holding(&symbol);
                }
                self.state.open_prompt(PromptKind::Trade { side, symbol });
            }
            Command::ToggleImpact { widget_id } => {
                let status = match self.renderer.toggle_impact(&widget_id) {
                    ImpactToggle::Collapsed => "Impact analysis closed",
                    ImpactToggle::Loading => "Loading impact analysis...",
                    ImpactToggle::Unavailable => "No impact analysis for this recommendation",
                };
                self.state.set_status(status);
            }
            Command::PromptFeedback {
                recommendation_type,
                recommendation_action,
            } => self.state.open_prompt(PromptKind::Feedback {
                recommendation_type,
                recommendation_action,
            }),
        }
    }

    fn confirm_remove(&mut self) {
        let section = self.state.current_section();
        if !section
            .interaction_categories()
            .contains(&InteractionCategory::HoldingActions)
        {
            return;
        }
        let symbol = self
            .renderer
            .widgets(section)
            .get(self.state.selected)
            .and_then(|widget| widget.target.symbol.clone());
        if let Some(symbol) = symbol {
            self.state.open_prompt(PromptKind::ConfirmRemove { symbol });
        }
    }

    fn handle_prompt_key(&mut self, code: KeyCode) {
        let Some(prompt) = self.state.prompt.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.state.prompt = None;
                self.state.set_status("Cancelled");
            }
            KeyCode::Backspace => prompt.pop(),
            KeyCode::Char(c) => prompt.push(c),
            KeyCode::Enter => {
                let Some(prompt) = self.state.prompt.take() else {
                    return;
                };
                let section = prompt.section;
                match prompt.into_action() {
                    Ok(Some(action)) => {
                        let description = action.describe();
                        match self.renderer.apply_action(section, action) {
                            Ok(()) => self.state.set_status(format!("Submitting {}", description)),
                            Err(error) => self.state.set_status(error.to_string()),
                        }
                    }
                    Ok(None) => self.state.set_status("Cancelled"),
                    Err(message) => self.state.set_status(message),
                }
            }
            _ => {}
        }
    }
}

/// Runs the dashboard until the user quits or a shutdown is broadcast.
pub async fn run<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> std::io::Result<()> {
    let mut shutdown_receiver = app.shutdown_sender.subscribe();
    app.start();

    loop {
        if shutdown_receiver.try_recv().is_ok() {
            break;
        }

        // Apply finished fetches and writes before drawing
        app.renderer.try_pump();

        while let Ok(event) = app.event_receiver.try_recv() {
            app.state.add_event(event);
        }
        let widget_count = app.widget_count();
        app.state.update(widget_count);

        terminal.draw(|f| render_dashboard(f, &app.state, &app.renderer))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if app.handle_key(key.code) == Flow::Quit {
                    let _ = app.shutdown_sender.send(());
                    break;
                }
            }
        }
    }

    app.renderer.shutdown();
    Ok(())
}
