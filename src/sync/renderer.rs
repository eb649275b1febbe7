//! Renderer
//!
//! Drives the fetch, reconcile and display cycle of every section. The
//! renderer is owned by a single loop (the dashboard or the headless printer);
//! everything that waits runs on the [`Scheduler`] and comes back as a
//! [`Completion`].
//!
//! Ordering inside one applied refresh: the section's widgets are cleared,
//! then the new widgets are built, then interaction handlers are attached.
//! A completion whose request id is no longer the latest for its section is
//! discarded.

use crate::consts::cli_consts::refresh;
use crate::error_classifier::ErrorClassifier;
use crate::events::{EventSender, EventType, Source};
use crate::logging::LogLevel;
use crate::network::endpoint::{Params, endpoints};
use crate::network::fetcher::{Ack, FailureReason, FetchResult, ResourceFetcher, SubmitError};
use crate::portfolio::payloads::{HoldingLookup, ImpactAnalysis};
use crate::portfolio::{Action, ValidationError};
use crate::sync::builders::{self, build_widget, impact_panel, impact_panel_id};
use crate::sync::interactions::{Command, Interaction, InteractionRouter, default_handler};
use crate::sync::registry::WidgetRegistry;
use crate::sync::scheduler::{Completion, Scheduler};
use crate::sync::section::{
    Notice, RefreshOutcome, RefreshTicket, Section, SectionSlot, SectionState,
};
use crate::sync::widget::Widget;
use chrono::Local;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RendererConfig {
    /// Wait between a successful write and the refreshes it triggers.
    pub settle_delay: Duration,
    /// Interval of the periodic refresh.
    pub refresh_interval: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            settle_delay: refresh::settle_delay(),
            refresh_interval: refresh::periodic_interval(),
        }
    }
}

/// Result of [`Renderer::toggle_impact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImpactToggle {
    /// The panel was open and has been disposed.
    Collapsed,
    /// The analysis is being fetched; the panel appears when it arrives.
    Loading,
    /// The widget is not a tradable recommendation.
    Unavailable,
}

pub struct Renderer {
    fetcher: ResourceFetcher,
    registry: WidgetRegistry,
    router: InteractionRouter,
    scheduler: Scheduler,
    slots: BTreeMap<Section, SectionSlot>,
    /// Quantities shown by the latest performance render or holding lookups.
    holdings: HashMap<String, f64>,
    events: EventSender,
    classifier: ErrorClassifier,
    config: RendererConfig,
}

impl Renderer {
    pub fn new(fetcher: ResourceFetcher, events: EventSender, config: RendererConfig) -> Self {
        Self {
            fetcher,
            registry: WidgetRegistry::new(),
            router: InteractionRouter::new(),
            scheduler: Scheduler::new(),
            slots: Section::ALL
                .iter()
                .map(|s| (*s, SectionSlot::default()))
                .collect(),
            holdings: HashMap::new(),
            events,
            classifier: ErrorClassifier::new(),
            config,
        }
    }

    pub fn slot(&self, section: Section) -> &SectionSlot {
        // Every section has a slot from construction on.
        &self.slots[&section]
    }

    fn slot_mut(&mut self, section: Section) -> &mut SectionSlot {
        self.slots.entry(section).or_default()
    }

    pub fn state(&self, section: Section) -> &SectionState {
        &self.slot(section).state
    }

    pub fn registry(&self) -> &WidgetRegistry {
        &self.registry
    }

    pub fn router(&self) -> &InteractionRouter {
        &self.router
    }

    pub fn widgets(&self, section: Section) -> Vec<&Widget> {
        self.registry.widgets(section)
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }

    fn event(&self, source: Source, section: Section, msg: String, kind: EventType, level: LogLevel) {
        self.events.section_event(source, section, msg, kind, level);
    }

    fn set_notice(&mut self, section: Section, level: LogLevel, message: String) {
        self.slot_mut(section).notice = Some(Notice { level, message });
    }

    // ---------------------------------------------------------------------
    // Refresh
    // ---------------------------------------------------------------------

    /// Enters the loading state and returns the ticket of the new request.
    /// Any earlier request of the section becomes stale.
    pub fn begin_refresh(&mut self, section: Section) -> RefreshTicket {
        let slot = self.slot_mut(section);
        slot.latest_request += 1;
        let request_id = slot.latest_request;
        slot.state = SectionState::Loading { request_id };
        slot.notice = None;
        self.event(
            Source::Renderer,
            section,
            section.loading_message(),
            EventType::Refresh,
            LogLevel::Debug,
        );
        RefreshTicket {
            section,
            request_id,
        }
    }

    /// Applies the result of a refresh unless a newer one has started.
    pub fn complete_refresh(&mut self, ticket: RefreshTicket, result: FetchResult) -> RefreshOutcome {
        let section = ticket.section;
        if ticket.request_id != self.slot(section).latest_request {
            self.event(
                Source::Renderer,
                section,
                format!("Discarded stale response #{}", ticket.request_id),
                EventType::StateChange,
                LogLevel::Debug,
            );
            return RefreshOutcome::Stale;
        }

        match result {
            FetchResult::Failed(reason) => {
                self.registry.clear_section(section);
                let level = self.classifier.classify_fetch_error(&reason);
                self.event(
                    Source::Fetcher,
                    section,
                    format!("{}: {}", section.error_message(), reason),
                    EventType::Error,
                    level,
                );
                self.slot_mut(section).state = SectionState::Error {
                    message: section.error_message().to_string(),
                    detail: reason.to_string(),
                };
            }
            FetchResult::Empty => {
                self.registry.clear_section(section);
                if section == Section::Performance {
                    self.holdings.clear();
                }
                self.event(
                    Source::Renderer,
                    section,
                    section.empty_message().to_string(),
                    EventType::StateChange,
                    LogLevel::Info,
                );
                self.slot_mut(section).state = SectionState::Empty {
                    message: section.empty_message().to_string(),
                };
            }
            FetchResult::Ok(items) => {
                self.registry.clear_section(section);
                if section == Section::Performance {
                    self.holdings.clear();
                }

                let mut rendered = 0;
                let mut skipped = 0;
                for item in &items {
                    match build_widget(section, item) {
                        Ok(widget) => {
                            if section == Section::Performance {
                                if let Some((symbol, quantity)) = builders::held_quantity(item) {
                                    self.holdings.insert(symbol, quantity);
                                }
                            }
                            self.registry.put(widget);
                            rendered += 1;
                        }
                        Err(error) => {
                            skipped += 1;
                            self.event(
                                Source::Renderer,
                                section,
                                format!("Skipped item {}", error),
                                EventType::Error,
                                self.classifier.classify_render_error(&error),
                            );
                        }
                    }
                }

                self.attach_handlers(section);

                if rendered == 0 {
                    self.set_notice(
                        section,
                        LogLevel::Warn,
                        format!("Could not render any of the {} items", skipped),
                    );
                }
                self.event(
                    Source::Renderer,
                    section,
                    format!("{} widgets rendered, {} skipped", rendered, skipped),
                    EventType::Success,
                    LogLevel::Info,
                );
                self.slot_mut(section).state = SectionState::Populated { rendered, skipped };
            }
        }
        self.slot_mut(section).last_updated = Some(Local::now());
        RefreshOutcome::Applied
    }

    /// Registers the handlers of each category of `section`, once per registry.
    fn attach_handlers(&mut self, section: Section) {
        for category in section.interaction_categories() {
            if self.registry.mark_attached(*category) {
                self.router.register(*category, default_handler(*category));
            }
        }
    }

    /// Starts a refresh in the background.
    pub fn refresh(&mut self, section: Section) -> RefreshTicket {
        let ticket = self.begin_refresh(section);
        let fetcher = self.fetcher.clone();
        self.scheduler.spawn(async move {
            let result = fetcher.fetch(&section.endpoint(), &Params::new()).await;
            Completion::Fetched { ticket, result }
        });
        ticket
    }

    /// Refreshes and applies the result before returning.
    pub async fn refresh_now(&mut self, section: Section) -> RefreshOutcome {
        let ticket = self.begin_refresh(section);
        let result = self.fetcher.fetch(&section.endpoint(), &Params::new()).await;
        self.complete_refresh(ticket, result)
    }

    pub fn refresh_all(&mut self) {
        for section in Section::ALL {
            self.refresh(section);
        }
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Holding quantity last seen for `symbol`.
    pub fn known_holding(&self, symbol: &str) -> Option<f64> {
        self.holdings.get(&symbol.trim().to_uppercase()).copied()
    }

    fn validate_action(&mut self, section: Section, action: &Action) -> Result<(), ValidationError> {
        let held = action.symbol().and_then(|symbol| self.known_holding(&symbol));
        if let Err(error) = action.validate(held) {
            self.set_notice(section, LogLevel::Warn, error.to_string());
            self.event(
                Source::Action,
                section,
                format!("{} rejected: {}", action.describe(), error),
                EventType::Error,
                LogLevel::Warn,
            );
            return Err(error);
        }
        Ok(())
    }

    /// Validates locally and submits in the background. Invalid actions are
    /// reported at once and never reach the network.
    pub fn apply_action(&mut self, section: Section, action: Action) -> Result<(), ValidationError> {
        self.validate_action(section, &action)?;
        self.event(
            Source::Action,
            section,
            format!("Submitting {}", action.describe()),
            EventType::Waiting,
            LogLevel::Info,
        );
        let fetcher = self.fetcher.clone();
        self.scheduler.spawn(async move {
            let result = fetcher.submit(&action).await;
            Completion::Submitted {
                section,
                action,
                result,
            }
        });
        Ok(())
    }

    /// Validates, submits and records the outcome before returning. Follow-up
    /// refreshes are scheduled as usual; [`Renderer::settle`] waits for them.
    pub async fn apply_action_now(
        &mut self,
        section: Section,
        action: Action,
    ) -> Result<Ack, SubmitError> {
        self.validate_action(section, &action)?;
        let result = self.fetcher.submit(&action).await;
        self.handle_submitted(section, &action, &result);
        result
    }

    fn handle_submitted(&mut self, section: Section, action: &Action, result: &Result<Ack, SubmitError>) {
        match result {
            Ok(ack) => {
                let message = match &ack.message {
                    Some(message) => format!("{} done: {}", action.describe(), message),
                    None => format!("{} done", action.describe()),
                };
                self.set_notice(section, LogLevel::Info, message.clone());
                self.event(Source::Action, section, message, EventType::Success, LogLevel::Info);

                let mut targets = vec![section];
                for dependent in action.dependent_sections() {
                    if !targets.contains(dependent) {
                        targets.push(*dependent);
                    }
                }
                for target in targets {
                    self.scheduler.schedule_refresh(target, self.config.settle_delay);
                }
            }
            Err(error) => {
                let message = if error.is_ambiguous() {
                    format!(
                        "{}: outcome unknown ({}). Refresh before retrying.",
                        action.describe(),
                        error
                    )
                } else {
                    format!("{} failed: {}", action.describe(), error)
                };
                self.set_notice(section, LogLevel::Error, message.clone());
                self.event(Source::Action, section, message, EventType::Error, LogLevel::Error);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Interactions
    // ---------------------------------------------------------------------

    pub fn dispatch(&mut self, interaction: &Interaction) -> Vec<Command> {
        self.router.dispatch(interaction, &self.registry)
    }

    /// Opens or collapses the impact panel of a recommendation widget.
    pub fn toggle_impact(&mut self, widget_id: &str) -> ImpactToggle {
        let section = Section::Recommendations;
        if self.registry.remove(section, &impact_panel_id(widget_id)) {
            return ImpactToggle::Collapsed;
        }

        let Some(widget) = self.registry.get(section, widget_id) else {
            return ImpactToggle::Unavailable;
        };
        let (Some(symbol), Some(rec)) = (
            widget.target.symbol.clone(),
            widget.target.recommendation.clone(),
        ) else {
            return ImpactToggle::Unavailable;
        };
        if !rec.tradable {
            return ImpactToggle::Unavailable;
        }

        let params: Params = vec![("type".to_string(), rec.kind), ("symbol".to_string(), symbol)];
        let generation = self.slot(section).latest_request;
        let widget_id = widget_id.to_string();
        let fetcher = self.fetcher.clone();
        self.scheduler.spawn(async move {
            let result = fetcher
                .lookup(&endpoints::IMPACT_ANALYSIS, &params)
                .await
                .and_then(|value| {
                    serde_json::from_value::<ImpactAnalysis>(value)
                        .map_err(|e| FailureReason::Decode(e.to_string()))
                });
            Completion::ImpactLoaded {
                widget_id,
                generation,
                result,
            }
        });
        ImpactToggle::Loading
    }

    fn handle_impact(
        &mut self,
        widget_id: String,
        generation: u64,
        result: Result<ImpactAnalysis, FailureReason>,
    ) {
        let section = Section::Recommendations;
        // The recommendations were re-rendered while the analysis loaded.
        if generation != self.slot(section).latest_request
            || self.registry.get(section, &widget_id).is_none()
        {
            log::debug!("discarded impact analysis for {}", widget_id);
            return;
        }
        match result {
            Ok(impact) => self.registry.put(impact_panel(&widget_id, &impact)),
            Err(reason) => {
                let message = format!("Impact analysis unavailable: {}", reason);
                self.set_notice(section, LogLevel::Warn, message.clone());
                self.event(Source::Fetcher, section, message, EventType::Error, LogLevel::Warn);
            }
        }
    }

    /// Looks up the held quantity of `symbol` in the background, so a sell
    /// prompt can be capped.
    pub fn request_holding(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        let params: Params = vec![("symbol".to_string(), symbol.clone())];
        let fetcher = self.fetcher.clone();
        self.scheduler.spawn(async move {
            let result = fetcher.lookup(&endpoints::HOLDINGS, &params).await.and_then(|value| {
                serde_json::from_value::<HoldingLookup>(value)
                    .map(|lookup| lookup.quantity())
                    .map_err(|e| FailureReason::Decode(e.to_string()))
            });
            Completion::HoldingLoaded { symbol, result }
        });
    }

    fn handle_holding(&mut self, symbol: String, result: Result<Option<f64>, FailureReason>) {
        match result {
            Ok(Some(quantity)) => {
                self.holdings.insert(symbol, quantity);
            }
            // 404 means the symbol is not held.
            Ok(None) | Err(FailureReason::HttpStatus { status: 404, .. }) => {
                self.holdings.remove(&symbol);
            }
            Err(reason) => log::debug!("holding lookup for {} failed: {}", symbol, reason),
        }
    }

    // ---------------------------------------------------------------------
    // Completions and timers
    // ---------------------------------------------------------------------

    pub fn handle(&mut self, completion: Completion) {
        match completion {
            Completion::Fetched { ticket, result } => {
                self.complete_refresh(ticket, result);
            }
            Completion::Submitted {
                section,
                action,
                result,
            } => self.handle_submitted(section, &action, &result),
            Completion::RefreshDue(section) => {
                self.refresh(section);
            }
            Completion::Tick {
                section,
                generation,
            } => {
                // Sent before the timer was stopped or restarted.
                if !self.scheduler.is_live_tick(section, generation) {
                    log::debug!("dropped tick of stopped {} timer", section);
                    return;
                }
                self.event(
                    Source::Scheduler,
                    section,
                    "Periodic refresh".to_string(),
                    EventType::Refresh,
                    LogLevel::Debug,
                );
                self.refresh(section);
            }
            Completion::ImpactLoaded {
                widget_id,
                generation,
                result,
            } => self.handle_impact(widget_id, generation, result),
            Completion::HoldingLoaded { symbol, result } => self.handle_holding(symbol, result),
        }
    }

    /// Waits for one completion and applies it.
    pub async fn pump(&mut self) -> bool {
        match self.scheduler.next().await {
            Some(completion) => {
                self.handle(completion);
                true
            }
            None => false,
        }
    }

    /// Applies every completion already delivered. Returns how many.
    pub fn try_pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.scheduler.try_next() {
            self.handle(completion);
            applied += 1;
        }
        applied
    }

    /// Applies completions until no spawned work is left, including refreshes
    /// scheduled by the completions themselves.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.scheduler.next_pending().await {
            self.handle(completion);
        }
    }

    /// Starts the periodic timer of each section. Ignored after
    /// [`Renderer::shutdown`].
    pub fn start_periodic(&mut self, sections: &[Section]) {
        for section in sections {
            if !self
                .scheduler
                .start_periodic(*section, self.config.refresh_interval)
            {
                log::debug!("not starting {} timer after shutdown", section);
            }
        }
    }

    /// Clears the periodic timer of `section`. Refreshes already scheduled by
    /// a write still run.
    pub fn stop_section(&mut self, section: Section) {
        if self.scheduler.stop(section) {
            self.event(
                Source::Scheduler,
                section,
                "Periodic refresh stopped".to_string(),
                EventType::StateChange,
                LogLevel::Debug,
            );
        }
    }

    pub fn has_timer(&self, section: Section) -> bool {
        self.scheduler.has_timer(section)
    }

    /// Cancels every task and timer.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        self.events.global_event(
            Source::Scheduler,
            "Timers cleared".to_string(),
            EventType::StateChange,
            LogLevel::Debug,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::error::BackendError;
    use crate::backend::{Backend, MockBackend, Query};
    use crate::network::fetcher::Item;
    use crate::portfolio::TradeOrder;
    use crate::sync::interactions::InteractionCategory;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    fn config() -> RendererConfig {
        RendererConfig {
            settle_delay: Duration::ZERO,
            refresh_interval: Duration::from_secs(3600),
        }
    }

    fn renderer_with(backend: impl Backend + 'static) -> Renderer {
        renderer_with_config(backend, config())
    }

    fn renderer_with_config(backend: impl Backend + 'static, config: RendererConfig) -> Renderer {
        let (events, _receiver) = EventSender::channel(16);
        Renderer::new(ResourceFetcher::new(Arc::new(backend)), events, config)
    }

    fn forecast(price: f64) -> Value {
        json!({
            "dates": ["2024-01-01"],
            "historical_prices": [price],
            "forecast_dates": ["2024-02-01"],
            "forecast_prices": [price * 1.1],
        })
    }

    /// A portfolio server keeping holdings in memory.
    struct FakeServer {
        holdings: Mutex<Vec<(String, f64)>>,
    }

    impl FakeServer {
        fn with(holdings: &[(&str, f64)]) -> Self {
            Self {
                holdings: Mutex::new(
                    holdings
                        .iter()
                        .map(|(s, q)| (s.to_string(), *q))
                        .collect(),
                ),
            }
        }
    }

    #[async_trait::async_trait]
    impl Backend for FakeServer {
        async fn get(&self, path: &str, query: &Query) -> Result<Vec<u8>, BackendError> {
            let holdings = self.holdings.lock().unwrap().clone();
            let body = match path {
                "portfolio/performance" => json!({
                    "total_value": holdings.iter().map(|(_, q)| q * 100.0).sum::<f64>(),
                    "holdings": holdings
                        .iter()
                        .map(|(s, q)| json!({"symbol": s, "quantity": q, "current_price": 100.0}))
                        .collect::<Vec<_>>(),
                }),
                "portfolio/holdings" => {
                    let symbol = &query[0].1;
                    match holdings.iter().find(|(s, _)| s == symbol) {
                        Some((_, q)) => json!({"holding": {"quantity": q}}),
                        None => {
                            return Err(BackendError::Http {
                                status: 404,
                                message: format!("No holding found for {}", symbol),
                            });
                        }
                    }
                }
                _ => json!({"recommendations": []}),
            };
            Ok(body.to_string().into_bytes())
        }

        async fn post(
            &self,
            path: &str,
            body: Value,
            _idempotency_key: &str,
        ) -> Result<Vec<u8>, BackendError> {
            assert_eq!(path, "portfolio/sell_shares");
            let symbol = body["symbol"].as_str().unwrap_or_default().to_string();
            let quantity = body["quantity"].as_f64().unwrap_or_default();
            let mut holdings = self.holdings.lock().unwrap();
            if let Some(position) = holdings.iter().position(|(s, _)| *s == symbol) {
                holdings[position].1 -= quantity;
                if holdings[position].1 <= 0.0 {
                    holdings.remove(position);
                }
            }
            Ok(br#"{"success": true}"#.to_vec())
        }

        async fn delete(&self, _path: &str, _key: &str) -> Result<Vec<u8>, BackendError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_second_refresh_supersedes_first() {
        let mut renderer = renderer_with(MockBackend::new());
        let first = renderer.begin_refresh(Section::Forecasts);
        let second = renderer.begin_refresh(Section::Forecasts);

        let newer = FetchResult::Ok(vec![
            Item::new("AAPL", forecast(180.0)),
            Item::new("MSFT", forecast(400.0)),
        ]);
        let older = FetchResult::Ok(vec![Item::new("AAPL", forecast(170.0))]);

        assert_eq!(renderer.complete_refresh(second, newer), RefreshOutcome::Applied);
        assert_eq!(renderer.complete_refresh(first, older), RefreshOutcome::Stale);

        assert_eq!(renderer.registry().section_count(Section::Forecasts), 2);
        assert_eq!(
            renderer.state(Section::Forecasts),
            &SectionState::Populated {
                rendered: 2,
                skipped: 0
            }
        );
    }

    #[tokio::test]
    async fn test_double_refresh_leaves_one_widget_set() {
        let mut mock = MockBackend::new();
        mock.expect_get().times(2).returning(|_, _| {
            let body = json!({"forecasts": {"AAPL": forecast(180.0), "MSFT": forecast(400.0)}});
            Ok(body.to_string().into_bytes())
        });
        let mut renderer = renderer_with(mock);

        renderer.refresh(Section::Forecasts);
        renderer.refresh(Section::Forecasts);
        renderer.settle().await;

        assert_eq!(renderer.registry().section_count(Section::Forecasts), 2);
        assert_eq!(renderer.registry().live_count(), 2);
        assert_eq!(renderer.slot(Section::Forecasts).latest_request, 2);
    }

    #[test]
    fn test_malformed_item_is_skipped_and_siblings_render() {
        let mut renderer = renderer_with(MockBackend::new());
        let ticket = renderer.begin_refresh(Section::Forecasts);
        let result = FetchResult::Ok(vec![
            Item::new("AAPL", forecast(180.0)),
            Item::new("MSFT", json!({"historical_prices": [400.0]})),
        ]);
        renderer.complete_refresh(ticket, result);

        let ids: Vec<&str> = renderer
            .widgets(Section::Forecasts)
            .iter()
            .map(|w| w.id.as_str())
            .collect();
        assert_eq!(ids, ["AAPL"]);
        assert_eq!(
            renderer.state(Section::Forecasts),
            &SectionState::Populated {
                rendered: 1,
                skipped: 1
            }
        );
        assert!(renderer.slot(Section::Forecasts).notice.is_none());
    }

    #[test]
    fn test_handlers_attach_once_across_refreshes() {
        let mut renderer = renderer_with(MockBackend::new());
        let recommendation = || {
            FetchResult::Ok(vec![Item::new(
                "buy-AAPL",
                json!({"type": "buy", "action": "Buy AAPL", "symbol": "AAPL"}),
            )])
        };
        for _ in 0..2 {
            let ticket = renderer.begin_refresh(Section::Recommendations);
            renderer.complete_refresh(ticket, recommendation());
        }
        assert_eq!(renderer.router().handler_count(InteractionCategory::Feedback), 1);

        let interaction = Interaction {
            category: InteractionCategory::Feedback,
            section: Section::Recommendations,
            widget_id: "buy-AAPL".to_string(),
        };
        let first = renderer.dispatch(&interaction);
        renderer.dispatch(&interaction);

        assert_eq!(renderer.router().invocations(InteractionCategory::Feedback), 2);
        assert_eq!(
            first,
            vec![Command::PromptFeedback {
                recommendation_type: "buy".to_string(),
                recommendation_action: "Buy AAPL".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_selling_whole_position_removes_it_after_refresh() {
        let mut renderer = renderer_with(FakeServer::with(&[("AAPL", 10.0), ("MSFT", 5.0)]));
        renderer.refresh_now(Section::Performance).await;
        assert!(renderer.registry().get(Section::Performance, "AAPL").is_some());
        assert_eq!(renderer.known_holding("aapl"), Some(10.0));

        let sell = Action::Sell(TradeOrder::new("AAPL", 10.0));
        renderer
            .apply_action(Section::Performance, sell)
            .unwrap();
        renderer.settle().await;

        assert!(renderer.registry().get(Section::Performance, "AAPL").is_none());
        assert!(renderer.registry().get(Section::Performance, "MSFT").is_some());
        assert_eq!(renderer.known_holding("AAPL"), None);
    }

    #[tokio::test]
    async fn test_sell_above_known_holding_is_rejected_locally() {
        let mut renderer = renderer_with(FakeServer::with(&[("AAPL", 10.0)]));
        renderer.request_holding("aapl");
        renderer.settle().await;
        assert_eq!(renderer.known_holding("AAPL"), Some(10.0));

        let result = renderer.apply_action(
            Section::Performance,
            Action::Sell(TradeOrder::new("AAPL", 11.0)),
        );
        assert!(matches!(result, Err(ValidationError::SellExceedsHolding { .. })));
        assert_eq!(renderer.pending(), 0);
    }

    #[tokio::test]
    async fn test_quantity_below_minimum_never_submits() {
        let mut mock = MockBackend::new();
        mock.expect_post().times(0);
        let mut renderer = renderer_with(mock);

        let result = renderer.apply_action(
            Section::Performance,
            Action::Buy(TradeOrder::new("AAPL", 0.0009)),
        );
        assert!(matches!(result, Err(ValidationError::QuantityTooSmall { .. })));
        assert_eq!(renderer.pending(), 0);
        assert!(renderer.slot(Section::Performance).notice.is_some());
    }

    #[tokio::test]
    async fn test_minimum_quantity_is_submitted() {
        let mut mock = MockBackend::new();
        mock.expect_post()
            .times(1)
            .returning(|_, _, _| Ok(br#"{"success": true}"#.to_vec()));
        mock.expect_get()
            .returning(|_, _| Ok(br#"{"holdings": []}"#.to_vec()));
        let mut renderer = renderer_with(mock);

        let ack = renderer
            .apply_action_now(Section::Performance, Action::Buy(TradeOrder::new("AAPL", 0.001)))
            .await;
        assert_eq!(ack, Ok(Ack::default()));
        renderer.settle().await;
        assert_eq!(
            renderer.state(Section::Performance),
            &SectionState::Empty {
                message: Section::Performance.empty_message().to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_empty_forecasts_show_no_data_state() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .returning(|_, _| Ok(br#"{"forecasts": {}}"#.to_vec()));
        let mut renderer = renderer_with(mock);

        renderer.refresh_now(Section::Forecasts).await;
        assert_eq!(
            renderer.state(Section::Forecasts),
            &SectionState::Empty {
                message: "No forecast data available".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_risk_failure_does_not_touch_recommendations() {
        let mut mock = MockBackend::new();
        mock.expect_get().returning(|path, _| match path {
            "portfolio/risk_analysis" => Err(BackendError::Http {
                status: 500,
                message: "Failed to analyze risk".to_string(),
            }),
            _ => Ok(json!({"recommendations": [
                {"type": "goal", "action": "Review goals", "priority": "low"}
            ]})
            .to_string()
            .into_bytes()),
        });
        let mut renderer = renderer_with(mock);

        renderer.refresh(Section::Recommendations);
        renderer.refresh(Section::Risk);
        renderer.settle().await;

        assert!(matches!(
            renderer.state(Section::Risk),
            SectionState::Error { .. }
        ));
        assert_eq!(
            renderer.state(Section::Recommendations),
            &SectionState::Populated {
                rendered: 1,
                skipped: 0
            }
        );
        assert_eq!(renderer.registry().section_count(Section::Recommendations), 1);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_widgets_and_sets_notice() {
        let mut mock = MockBackend::new();
        mock.expect_post().times(1).returning(|_, _, _| {
            Err(BackendError::Http {
                status: 400,
                message: "Not enough shares".to_string(),
            })
        });
        let mut renderer = renderer_with(mock);
        let ticket = renderer.begin_refresh(Section::Performance);
        renderer.complete_refresh(
            ticket,
            FetchResult::Ok(vec![Item::new("AAPL", json!({"symbol": "AAPL", "quantity": 1}))]),
        );

        renderer
            .apply_action(Section::Performance, Action::Sell(TradeOrder::new("AAPL", 1.0)))
            .unwrap();
        renderer.settle().await;

        assert_eq!(renderer.registry().section_count(Section::Performance), 1);
        let notice = renderer.slot(Section::Performance).notice.clone().unwrap();
        assert_eq!(notice.level, LogLevel::Error);
        assert!(notice.message.contains("Not enough shares"));
    }

    #[tokio::test]
    async fn test_impact_panel_toggles() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .withf(|path, _| path.to_string() == "portfolio/impact-analysis")
            .times(1)
            .returning(|_, _| {
                Ok(json!({"current_value": 100.0, "projected_value": 110.0})
                    .to_string()
                    .into_bytes())
            });
        let mut renderer = renderer_with(mock);
        let ticket = renderer.begin_refresh(Section::Recommendations);
        renderer.complete_refresh(
            ticket,
            FetchResult::Ok(vec![Item::new(
                "buy-AAPL",
                json!({"type": "buy", "action": "Buy AAPL", "symbol": "AAPL"}),
            )]),
        );

        assert_eq!(renderer.toggle_impact("buy-AAPL"), ImpactToggle::Loading);
        renderer.settle().await;
        assert!(renderer
            .registry()
            .get(Section::Recommendations, "buy-AAPL/impact")
            .is_some());

        assert_eq!(renderer.toggle_impact("buy-AAPL"), ImpactToggle::Collapsed);
        assert_eq!(renderer.registry().section_count(Section::Recommendations), 1);
    }

    #[tokio::test]
    async fn test_impact_arriving_after_rerender_is_discarded() {
        let mut mock = MockBackend::new();
        mock.expect_get()
            .returning(|_, _| Ok(json!({"current_value": 1.0}).to_string().into_bytes()));
        let mut renderer = renderer_with(mock);
        let rec = || {
            FetchResult::Ok(vec![Item::new(
                "sell-TSLA",
                json!({"type": "sell", "action": "Trim TSLA", "symbol": "TSLA"}),
            )])
        };
        let ticket = renderer.begin_refresh(Section::Recommendations);
        renderer.complete_refresh(ticket, rec());

        renderer.toggle_impact("sell-TSLA");
        let ticket = renderer.begin_refresh(Section::Recommendations);
        renderer.complete_refresh(ticket, rec());
        renderer.settle().await;

        assert!(renderer
            .registry()
            .get(Section::Recommendations, "sell-TSLA/impact")
            .is_none());
    }

    #[tokio::test]
    async fn test_stop_section_and_shutdown_clear_timers() {
        let mut renderer = renderer_with(MockBackend::new());
        renderer.start_periodic(&Section::ALL);
        assert!(renderer.has_timer(Section::News));

        renderer.stop_section(Section::News);
        assert!(!renderer.has_timer(Section::News));
        assert!(renderer.has_timer(Section::Risk));

        renderer.shutdown();
        assert!(Section::ALL.iter().all(|s| !renderer.has_timer(*s)));
    }

    #[tokio::test]
    async fn test_ticks_queued_before_stop_do_not_refresh() {
        // No GET expectation: a refresh would panic the mock.
        let mut renderer = renderer_with_config(
            MockBackend::new(),
            RendererConfig {
                settle_delay: Duration::ZERO,
                refresh_interval: Duration::from_millis(5),
            },
        );
        renderer.start_periodic(&[Section::News]);
        tokio::time::sleep(Duration::from_millis(30)).await;
        renderer.stop_section(Section::News);

        renderer.try_pump();
        assert_eq!(renderer.slot(Section::News).latest_request, 0);
        assert_eq!(renderer.state(Section::News), &SectionState::Idle);
    }

    #[tokio::test]
    async fn test_pausing_timer_keeps_post_write_refresh() {
        let mut renderer = renderer_with_config(
            FakeServer::with(&[("AAPL", 10.0)]),
            RendererConfig {
                settle_delay: Duration::from_millis(50),
                refresh_interval: Duration::from_secs(3600),
            },
        );
        renderer.start_periodic(&[Section::Performance]);
        let ack = renderer
            .apply_action_now(Section::Performance, Action::Sell(TradeOrder::new("AAPL", 1.0)))
            .await;
        assert!(ack.is_ok());
        renderer.stop_section(Section::Performance);
        renderer.settle().await;

        assert!(renderer.slot(Section::Performance).latest_request > 0);
        assert_eq!(renderer.known_holding("AAPL"), Some(9.0));
    }

    #[tokio::test]
    async fn test_timers_do_not_restart_after_shutdown() {
        let mut renderer = renderer_with(MockBackend::new());
        renderer.shutdown();
        renderer.start_periodic(&[Section::Risk]);
        assert!(!renderer.has_timer(Section::Risk));
    }
}
