//! Event registry: synchronous dispatch to registered handlers
//!
//! Handlers are held by value and keyed on `(element id, event type)`.
//! Dispatch runs every matching handler in registration order with a
//! mutable borrow of the document; handlers must not re-enter the pipeline.

use super::MutationResult;
use crate::renderer::dom::Document;

/// Event types the bridge understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Click,
    Input,
    Change,
}

impl EventType {
    /// Lowercase event name
    pub fn name(&self) -> &'static str {
        match self {
            EventType::Click => "click",
            EventType::Input => "input",
            EventType::Change => "change",
        }
    }
}

/// An event aimed at an element id
#[derive(Debug, Clone)]
pub struct DomEvent {
    pub event_type: EventType,
    pub target_id: String,
    /// Payload for input/change events
    pub value: String,
}

impl DomEvent {
    pub fn new(event_type: EventType, target_id: impl Into<String>) -> Self {
        Self {
            event_type,
            target_id: target_id.into(),
            value: String::new(),
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// Handler callback; receives the document and the event
pub type EventHandler = Box<dyn Fn(&mut Document, &DomEvent)>;

struct EventBinding {
    target_id: String,
    event_type: EventType,
    handler: EventHandler,
}

/// Registry of event handlers
#[derive(Default)]
pub struct EventRegistry {
    bindings: Vec<EventBinding>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Register a handler; repeated registrations accumulate in order
    pub fn add_listener(
        &mut self,
        target_id: impl Into<String>,
        event_type: EventType,
        handler: EventHandler,
    ) {
        self.bindings.push(EventBinding {
            target_id: target_id.into(),
            event_type,
            handler,
        });
    }

    /// Invoke every matching handler in registration order. Handlers may
    /// mutate the document.
    pub fn dispatch(&self, document: &mut Document, event: &DomEvent) -> MutationResult {
        let mut any_handled = false;

        for binding in &self.bindings {
            if binding.target_id == event.target_id && binding.event_type == event.event_type {
                (binding.handler)(document, event);
                any_handled = true;
            }
        }

        if !any_handled {
            return MutationResult {
                ok: true,
                message: "No handler for event".to_string(),
            };
        }
        MutationResult::ok()
    }

    pub fn listener_count(&self) -> usize {
        self.bindings.len()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::set_text_by_id;
    use crate::renderer::html::HtmlParser;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn document(html: &str) -> Document {
        HtmlParser::new().parse(html).unwrap()
    }

    #[test]
    fn test_event_type_names() {
        assert_eq!(EventType::Click.name(), "click");
        assert_eq!(EventType::Input.name(), "input");
        assert_eq!(EventType::Change.name(), "change");
    }

    #[test]
    fn test_dispatch_invokes_matching_handler() {
        let mut doc = document(r#"<button id="go">Go</button>"#);
        let mut registry = EventRegistry::new();

        registry.add_listener(
            "go",
            EventType::Click,
            Box::new(|doc, _event| {
                set_text_by_id(doc, "go", "Clicked");
            }),
        );

        let result = registry.dispatch(&mut doc, &DomEvent::new(EventType::Click, "go"));
        assert!(result.ok);
        assert_eq!(result.message, "OK");
        assert_eq!(doc.root.find_by_id("go").unwrap().inner_text(), "Clicked");
    }

    #[test]
    fn test_dispatch_without_handler_reports_no_handler() {
        let mut doc = document("<div></div>");
        let registry = EventRegistry::new();
        let result = registry.dispatch(&mut doc, &DomEvent::new(EventType::Click, "nope"));
        assert!(result.ok);
        assert_eq!(result.message, "No handler for event");
    }

    #[test]
    fn test_handlers_run_in_registration_order() {
        let mut doc = document(r#"<div id="t"></div>"#);
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut registry = EventRegistry::new();

        let first = Rc::clone(&order);
        registry.add_listener(
            "t",
            EventType::Input,
            Box::new(move |_, _| first.borrow_mut().push(1)),
        );
        let second = Rc::clone(&order);
        registry.add_listener(
            "t",
            EventType::Input,
            Box::new(move |_, _| second.borrow_mut().push(2)),
        );

        registry.dispatch(&mut doc, &DomEvent::new(EventType::Input, "t"));
        assert_eq!(*order.borrow(), vec![1, 2]);
    }

    #[test]
    fn test_dispatch_filters_by_type_and_target() {
        let mut doc = document(r#"<div id="a"></div><div id="b"></div>"#);
        let hits = Rc::new(RefCell::new(0));
        let mut registry = EventRegistry::new();

        let counter = Rc::clone(&hits);
        registry.add_listener(
            "a",
            EventType::Click,
            Box::new(move |_, _| *counter.borrow_mut() += 1),
        );

        registry.dispatch(&mut doc, &DomEvent::new(EventType::Click, "b"));
        registry.dispatch(&mut doc, &DomEvent::new(EventType::Input, "a"));
        assert_eq!(*hits.borrow(), 0);

        registry.dispatch(&mut doc, &DomEvent::new(EventType::Click, "a"));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_event_value_passed_to_handler() {
        let mut doc = document(r#"<input id="field">"#);
        let seen = Rc::new(RefCell::new(String::new()));
        let mut registry = EventRegistry::new();

        let sink = Rc::clone(&seen);
        registry.add_listener(
            "field",
            EventType::Input,
            Box::new(move |_, event| {
                *sink.borrow_mut() = event.value.clone();
            }),
        );

        registry.dispatch(
            &mut doc,
            &DomEvent::new(EventType::Input, "field").with_value("typed"),
        );
        assert_eq!(*seen.borrow(), "typed");
    }

    #[test]
    fn test_clear_and_listener_count() {
        let mut registry = EventRegistry::new();
        registry.add_listener("a", EventType::Click, Box::new(|_, _| {}));
        registry.add_listener("a", EventType::Change, Box::new(|_, _| {}));
        assert_eq!(registry.listener_count(), 2);

        registry.clear();
        assert_eq!(registry.listener_count(), 0);
    }
}
