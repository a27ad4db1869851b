//! Events dispatched by an include element.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Load,
}

/// Fired once per completed include run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadEvent {
    /// The `source` value the run was started for.
    pub source: String,
    pub bubbles: bool,
}

impl LoadEvent {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            bubbles: false,
        }
    }

    pub fn event_type(&self) -> EventType {
        EventType::Load
    }
}

type Listener<'a> = Rc<dyn Fn(&LoadEvent) + 'a>;

#[derive(Default)]
pub(crate) struct EventTarget<'a> {
    listeners: RefCell<Vec<(EventType, Listener<'a>)>>,
    once: RefCell<Vec<oneshot::Sender<LoadEvent>>>,
}

impl<'a> EventTarget<'a> {
    pub(crate) fn add_event_listener(&self, event_type: EventType, listener: Listener<'a>) {
        self.listeners.borrow_mut().push((event_type, listener));
    }

    pub(crate) fn once(&self) -> oneshot::Receiver<LoadEvent> {
        let (sender, receiver) = oneshot::channel();
        self.once.borrow_mut().push(sender);
        receiver
    }

    pub(crate) fn dispatch(&self, event: &LoadEvent) {
        // Listeners may register further listeners while running.
        let listeners: Vec<Listener<'a>> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(event_type, _)| *event_type == event.event_type())
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(event);
        }

        let waiting = std::mem::take(&mut *self.once.borrow_mut());
        for sender in waiting {
            let _ = sender.send(event.clone());
        }
    }
}
