//! Widget Registry
//!
//! Single owner of every live widget, keyed by `(section, id)`. At most one
//! live widget exists per key: replacing or clearing disposes the old one
//! first. The registry also holds the attach guards for event delegation; one
//! registry instance is one attach epoch.

use crate::sync::interactions::InteractionCategory;
use crate::sync::section::Section;
use crate::sync::widget::Widget;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct WidgetRegistry {
    sections: BTreeMap<Section, HashMap<String, Widget>>,
    attached: HashSet<InteractionCategory>,
    next_sequence: u64,
    disposed: usize,
}

impl WidgetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, section: Section, id: &str) -> Option<&Widget> {
        self.sections.get(&section)?.get(id)
    }

    /// Stores `widget` under its owner section and id, disposing any widget
    /// already stored there.
    pub fn put(&mut self, mut widget: Widget) {
        self.next_sequence += 1;
        widget.sequence = self.next_sequence;
        let slot = self.sections.entry(widget.owner_section).or_default();
        if let Some(previous) = slot.remove(&widget.id) {
            previous.dispose();
            self.disposed += 1;
        }
        slot.insert(widget.id.clone(), widget);
    }

    /// Disposes one widget. Returns whether it existed.
    pub fn remove(&mut self, section: Section, id: &str) -> bool {
        match self.sections.get_mut(&section).and_then(|s| s.remove(id)) {
            Some(widget) => {
                widget.dispose();
                self.disposed += 1;
                true
            }
            None => false,
        }
    }

    /// Disposes every widget owned by `section`. Returns how many there were.
    pub fn clear_section(&mut self, section: Section) -> usize {
        let Some(widgets) = self.sections.get_mut(&section) else {
            return 0;
        };
        let count = widgets.len();
        for (_, widget) in widgets.drain() {
            widget.dispose();
        }
        self.disposed += count;
        count
    }

    /// Widgets of `section` in render order.
    pub fn widgets(&self, section: Section) -> Vec<&Widget> {
        let mut widgets: Vec<&Widget> = self
            .sections
            .get(&section)
            .map(|s| s.values().collect())
            .unwrap_or_default();
        widgets.sort_by_key(|w| w.sequence);
        widgets
    }

    /// Records that `category` has its handlers attached.
    ///
    /// Returns `true` only for the call that performs the transition, so the
    /// caller attaches exactly once per registry lifetime.
    pub fn mark_attached(&mut self, category: InteractionCategory) -> bool {
        self.attached.insert(category)
    }

    pub fn is_attached(&self, category: InteractionCategory) -> bool {
        self.attached.contains(&category)
    }

    pub fn section_count(&self, section: Section) -> usize {
        self.sections.get(&section).map_or(0, HashMap::len)
    }

    pub fn live_count(&self) -> usize {
        self.sections.values().map(HashMap::len).sum()
    }

    pub fn disposed_count(&self) -> usize {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::widget::{Cell, WidgetBody};

    fn row(section: Section, id: &str, text: &str) -> Widget {
        Widget::new(section, id, WidgetBody::Row(vec![Cell::plain(text)]))
    }

    #[test]
    fn test_put_disposes_previous_widget_for_same_key() {
        let mut registry = WidgetRegistry::new();
        registry.put(row(Section::Performance, "AAPL", "old"));
        registry.put(row(Section::Performance, "AAPL", "new"));

        assert_eq!(registry.live_count(), 1);
        assert_eq!(registry.disposed_count(), 1);
        let widget = registry.get(Section::Performance, "AAPL").unwrap();
        assert_eq!(widget.to_string(), "new");
    }

    #[test]
    fn test_same_id_in_different_sections_are_distinct() {
        let mut registry = WidgetRegistry::new();
        registry.put(row(Section::Performance, "AAPL", "holding"));
        registry.put(row(Section::Risk, "AAPL", "risk"));
        assert_eq!(registry.live_count(), 2);
        assert_eq!(registry.disposed_count(), 0);
    }

    #[test]
    fn test_clear_section_only_touches_that_section() {
        let mut registry = WidgetRegistry::new();
        registry.put(row(Section::Forecasts, "AAPL", "a"));
        registry.put(row(Section::Forecasts, "MSFT", "m"));
        registry.put(row(Section::News, "headline", "n"));

        assert_eq!(registry.clear_section(Section::Forecasts), 2);
        assert_eq!(registry.section_count(Section::Forecasts), 0);
        assert_eq!(registry.section_count(Section::News), 1);
        assert_eq!(registry.disposed_count(), 2);
        assert_eq!(registry.clear_section(Section::Risk), 0);
    }

    #[test]
    fn test_widgets_are_listed_in_render_order() {
        let mut registry = WidgetRegistry::new();
        for id in ["MSFT", "AAPL", "NVDA"] {
            registry.put(row(Section::Performance, id, id));
        }
        let ids: Vec<&str> = registry
            .widgets(Section::Performance)
            .iter()
            .map(|w| w.id.as_str())
            .collect();
        assert_eq!(ids, ["MSFT", "AAPL", "NVDA"]);
    }

    #[test]
    fn test_mark_attached_transitions_once() {
        let mut registry = WidgetRegistry::new();
        assert!(!registry.is_attached(InteractionCategory::Feedback));
        assert!(registry.mark_attached(InteractionCategory::Feedback));
        assert!(!registry.mark_attached(InteractionCategory::Feedback));
        assert!(registry.is_attached(InteractionCategory::Feedback));
        assert!(!registry.is_attached(InteractionCategory::TradeActions));
    }

    #[test]
    fn test_remove_disposes() {
        let mut registry = WidgetRegistry::new();
        registry.put(row(Section::Recommendations, "panel", "p"));
        assert!(registry.remove(Section::Recommendations, "panel"));
        assert!(!registry.remove(Section::Recommendations, "panel"));
        assert_eq!(registry.disposed_count(), 1);
    }
}
