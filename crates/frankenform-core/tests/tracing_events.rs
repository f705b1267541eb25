#![forbid(unsafe_code)]

//! Structured logging tests.
//!
//! A capture layer records every `tracing` event emitted while a closure
//! runs, so the tests can check that state transitions are logged once
//! each and carry their event type.

use std::sync::{Arc, Mutex};

use frankenform_core::{Form, FormConfig, FormValidator, Outcome, Value, json};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

/// One captured event: its message and its `event` field, if any.
#[derive(Debug, Clone, Default)]
struct CapturedEvent {
    message: String,
    event_type: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct EventVisitor(CapturedEvent);

impl tracing::field::Visit for EventVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.0.message = format!("{value:?}"),
            "event" => self.0.event_type = Some(format!("{value:?}")),
            _ => {}
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.0.message = value.to_string(),
            "event" => self.0.event_type = Some(value.to_string()),
            _ => {}
        }
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = EventVisitor(CapturedEvent::default());
        event.record(&mut visitor);
        self.events.lock().unwrap().push(visitor.0);
    }
}

fn with_captured_events(f: impl FnOnce()) -> Vec<CapturedEvent> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: Arc::clone(&events),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = events.lock().unwrap().clone();
    captured
}

fn form_events(captured: &[CapturedEvent]) -> Vec<String> {
    captured
        .iter()
        .filter(|event| event.message == "form event")
        .filter_map(|event| event.event_type.clone())
        .collect()
}

fn echo_form(values: Value) -> Form {
    Form::new(
        FormConfig::new(values, Arc::new(|values, _| Outcome::pending(async move { Ok(values) })))
            .form_validator(FormValidator::sync(|values| {
                (values["name"] == json!("")).then(|| json!({"name": "required"}))
            })),
    )
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn each_state_transition_is_logged_once() {
    let form = echo_form(json!({"name": ""}));
    let captured = with_captured_events(|| {
        form.set_errors(json!({"name": "x"}));
        form.set_errors(json!({"name": "x"}));
        form.set_status(json!("editing"));
    });

    assert_eq!(
        form_events(&captured),
        vec!["errors_changed".to_string(), "status_changed".to_string()]
    );
}

#[test]
fn logged_events_match_the_trace() {
    let form = echo_form(json!({"name": ""}));
    let captured = with_captured_events(|| {
        pollster::block_on(form.submit_form()).unwrap();
        pollster::block_on(form.set_field_value("name", json!("ada"), None)).unwrap();
        pollster::block_on(form.submit_form()).unwrap();
    });

    let traced: Vec<String> = form
        .trace()
        .events()
        .iter()
        .map(|event| event.event_type().to_string())
        .collect();
    assert!(!traced.is_empty());
    assert_eq!(form_events(&captured), traced);
}
