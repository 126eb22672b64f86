//! Capturing `tracing` warnings emitted by the composition model.

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

/// Warnings seen while running a closure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WarningCount {
    /// Every `WARN` event.
    pub total: usize,
    /// Events tagged `warning = "NotProcessed"`.
    pub not_processed: usize,
    /// `component` field of each `NotProcessed` event, in order.
    pub components: Vec<String>,
}

struct CountingLayer {
    counts: Arc<Mutex<WarningCount>>,
}

#[derive(Default)]
struct WarningFields {
    not_processed: bool,
    component: Option<String>,
}

impl Visit for WarningFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "warning" => self.not_processed = value == "NotProcessed",
            "component" => self.component = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, _field: &Field, _value: &dyn fmt::Debug) {}
}

impl<S: Subscriber> Layer<S> for CountingLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        let mut fields = WarningFields::default();
        event.record(&mut fields);
        let Ok(mut counts) = self.counts.lock() else {
            return;
        };
        counts.total += 1;
        if fields.not_processed {
            counts.not_processed += 1;
            counts.components.push(fields.component.unwrap_or_default());
        }
    }
}

/// Runs `f` with a thread-local subscriber counting `WARN` events.
pub fn count_warnings<R>(f: impl FnOnce() -> R) -> (R, WarningCount) {
    let counts = Arc::new(Mutex::new(WarningCount::default()));
    let subscriber = Registry::default().with(CountingLayer {
        counts: Arc::clone(&counts),
    });
    let result = tracing::subscriber::with_default(subscriber, f);
    let counts = counts
        .lock()
        .map(|counts| counts.clone())
        .unwrap_or_default();
    (result, counts)
}
