#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use dom::{Document, Node, NodeRef};
use futures::channel::oneshot;
use lazy_include::{
    EventType, ExecutionContext, FetchError, IncludeConfig, IncludeElement, LoadEvent, Platform,
    RequestInit, RequestMode, Response, ScriptError, ScriptExecutor, StylesheetRegistry,
};

enum Route {
    Ready(Response),
    Network(String),
    Gated(oneshot::Receiver<Response>),
}

/// Serves canned responses by URL. Unknown URLs answer `404 Not Found`.
#[derive(Default)]
pub struct MockFetcher {
    routes: RefCell<HashMap<String, Route>>,
    requests: RefCell<Vec<(String, RequestMode)>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, body: &str) {
        self.route(url, Route::Ready(Response::with_body(body)));
    }

    pub fn status(&self, url: &str, status: u16, status_text: &str) {
        self.route(url, Route::Ready(Response::new(status, status_text, "")));
    }

    pub fn fail(&self, url: &str, message: &str) {
        self.route(url, Route::Network(message.to_string()));
    }

    /// The response for `url` is held back until the returned sender fires.
    pub fn gate(&self, url: &str) -> oneshot::Sender<Response> {
        let (sender, receiver) = oneshot::channel();
        self.route(url, Route::Gated(receiver));
        sender
    }

    pub fn requests(&self) -> Vec<(String, RequestMode)> {
        self.requests.borrow().clone()
    }

    fn route(&self, url: &str, route: Route) {
        self.routes.borrow_mut().insert(url.to_string(), route);
    }
}

#[async_trait(?Send)]
impl lazy_include::Fetch for MockFetcher {
    async fn fetch(&self, url: &str, init: &RequestInit) -> Result<Response, FetchError> {
        self.requests
            .borrow_mut()
            .push((url.to_string(), init.mode));

        let route = self.routes.borrow_mut().remove(url);
        let gate = match route {
            Some(Route::Ready(response)) => {
                self.route(url, Route::Ready(response.clone()));
                return Ok(response);
            }
            Some(Route::Network(message)) => {
                self.route(url, Route::Network(message.clone()));
                return Err(FetchError::Network {
                    url: url.to_string(),
                    message,
                });
            }
            Some(Route::Gated(receiver)) => receiver,
            None => return Ok(Response::new(404, "Not Found", "")),
        };

        gate.await.map_err(|_| FetchError::Network {
            url: url.to_string(),
            message: "gate dropped".to_string(),
        })
    }
}

pub struct Execution<'a> {
    pub source: String,
    pub context: ExecutionContext<'a>,
}

/// Records every script it is asked to run. Sources listed in `failing` fail.
#[derive(Default)]
pub struct RecordingExecutor<'a> {
    executions: RefCell<Vec<Execution<'a>>>,
    failing: RefCell<Vec<String>>,
}

impl<'a> RecordingExecutor<'a> {
    pub fn new() -> Self {
        Self {
            executions: RefCell::new(Vec::new()),
            failing: RefCell::new(Vec::new()),
        }
    }

    pub fn fail_on(&self, source: &str) {
        self.failing.borrow_mut().push(source.to_string());
    }

    pub fn sources(&self) -> Vec<String> {
        self.executions
            .borrow()
            .iter()
            .map(|execution| execution.source.clone())
            .collect()
    }

    pub fn contexts(&self) -> Vec<Option<NodeRef<'a>>> {
        self.executions
            .borrow()
            .iter()
            .map(|execution| execution.context.element())
            .collect()
    }
}

impl<'a> ScriptExecutor<'a> for RecordingExecutor<'a> {
    fn execute(&self, source: &str, context: ExecutionContext<'a>) -> Result<(), ScriptError> {
        self.executions.borrow_mut().push(Execution {
            source: source.to_string(),
            context,
        });
        if self.failing.borrow().iter().any(|failing| failing == source) {
            return Err(ScriptError::Failed {
                message: format!("{source} threw"),
            });
        }
        Ok(())
    }
}

/// An include element wired to mock collaborators.
pub struct Harness<'a> {
    pub document: Document<'a>,
    pub fetcher: Rc<MockFetcher>,
    pub stylesheets: Rc<StylesheetRegistry>,
    pub scripts: Rc<RecordingExecutor<'a>>,
    pub element: IncludeElement<'a>,
    pub loads: Rc<RefCell<Vec<LoadEvent>>>,
}

impl<'a> Harness<'a> {
    pub fn new(document: Document<'a>) -> Self {
        let host = document.create_element("lazy-html-include");
        Self::with_host(document, host, StylesheetRegistry::new(), IncludeConfig::default())
    }

    pub fn with_host(
        document: Document<'a>,
        host: NodeRef<'a>,
        stylesheets: StylesheetRegistry,
        config: IncludeConfig,
    ) -> Self {
        let fetcher = Rc::new(MockFetcher::new());
        let stylesheets = Rc::new(stylesheets);
        let scripts = Rc::new(RecordingExecutor::new());
        let platform = Platform {
            fetch: fetcher.clone(),
            stylesheets: stylesheets.clone(),
            scripts: scripts.clone(),
        };
        let element = IncludeElement::new(document, host, platform, config).unwrap();

        let loads = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&loads);
        element.add_event_listener(EventType::Load, move |event| {
            seen.borrow_mut().push(event.clone())
        });

        Self {
            document,
            fetcher,
            stylesheets,
            scripts,
            element,
            loads,
        }
    }

    /// `source` values of the load events seen so far.
    pub fn loaded_sources(&self) -> Vec<String> {
        self.loads
            .borrow()
            .iter()
            .map(|event| event.source.clone())
            .collect()
    }

    pub fn is_host(&self, node: Option<NodeRef<'a>>) -> bool {
        Node::are_same_optional(node, Some(self.element.host()))
    }
}
