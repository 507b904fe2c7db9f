//! Render dispatcher for the observer pattern

use tracing::{debug, info};

use crate::data::datatable::{Column, Dataset};
use crate::state::events::{EngineSnapshot, TableEvent};

/// Trait for components that want to run after every successful render,
/// e.g. to attach tooltips or row decorations to the projected table
pub trait RenderObserver {
    /// Called synchronously once the grid has been produced
    fn on_rendered(&mut self, dataset: &Dataset, columns: &[Column], snapshot: &EngineSnapshot);

    /// Get observer name for debugging
    fn name(&self) -> &str;
}

/// Keeps the observers of one table and a bounded history of its events
pub struct RenderDispatcher {
    observers: Vec<Box<dyn RenderObserver>>,

    /// Event history for debugging
    event_history: Vec<TableEvent>,

    /// Maximum event history size
    max_history: usize,
}

impl Default for RenderDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RenderDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderDispatcher")
            .field(
                "observers",
                &self.observers.iter().map(|o| o.name()).collect::<Vec<_>>(),
            )
            .field("event_history", &self.event_history.len())
            .finish()
    }
}

impl RenderDispatcher {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            event_history: Vec::new(),
            max_history: 100,
        }
    }

    /// Add an observer
    pub fn subscribe(&mut self, observer: Box<dyn RenderObserver>) {
        info!("RenderDispatcher: Adding observer: {}", observer.name());
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Record an event in the bounded history
    pub fn record(&mut self, event: TableEvent) {
        debug!("RenderDispatcher: Recording event: {:?}", event);
        self.event_history.push(event);
        if self.event_history.len() > self.max_history {
            self.event_history.remove(0);
        }
    }

    /// Notify every observer that a render completed
    pub fn notify_rendered(&mut self, dataset: &Dataset, snapshot: &EngineSnapshot) {
        for observer in &mut self.observers {
            debug!("RenderDispatcher: Notifying observer: {}", observer.name());
            observer.on_rendered(dataset, &dataset.columns, snapshot);
        }
    }

    /// Get event history for debugging
    pub fn get_event_history(&self) -> &[TableEvent] {
        &self.event_history
    }
}
