//! Waiting for `<link rel="stylesheet">` elements to finish loading.

use std::cell::RefCell;
use std::collections::HashMap;

use dom::{DomException, ErrorName, NodeRef};
use futures::channel::oneshot;

/// A loaded style sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    pub href: String,
    pub rules: String,
}

/// The terminal event a link element fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Load(StyleSheet),
    Error,
}

/// Platform hooks for observing link elements.
pub trait StylesheetLoader<'a> {
    /// Whether link elements fire load and error events at all.
    fn supports_load_events(&self) -> bool {
        true
    }

    /// The sheet of `link` if it has finished loading.
    ///
    /// May fail with `SecurityError` or `InvalidAccessError` while the sheet
    /// is not yet accessible.
    fn sheet(&self, link: NodeRef<'a>) -> Result<Option<StyleSheet>, DomException>;

    /// Registers a single-fire listener for the next load or error event of `link`.
    fn subscribe(&self, link: NodeRef<'a>) -> oneshot::Receiver<LinkEvent>;
}

/// Whether `node` is a `<link>` whose `rel` includes `stylesheet`.
pub fn is_stylesheet_link(node: NodeRef<'_>) -> bool {
    node.is_element_with_tag("link")
        && node.get_attribute("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
}

/// Resolves once `link` has loaded or failed.
///
/// Resolves immediately with `None` when the platform cannot report link
/// loading, and with the sheet when it has already loaded. A load error
/// resolves with `None`. There is no timeout.
pub async fn link_loaded<'a, L>(
    loader: &L,
    link: NodeRef<'a>,
) -> Result<Option<StyleSheet>, DomException>
where
    L: StylesheetLoader<'a> + ?Sized,
{
    if !loader.supports_load_events() {
        return Ok(None);
    }

    match loader.sheet(link) {
        Ok(Some(sheet)) => return Ok(Some(sheet)),
        Ok(None) => {}
        Err(error) if error.is_access_failure() => {
            tracing::debug!(
                href = %link.get_attribute("href").unwrap_or_default(),
                error = %error,
                "stylesheet not accessible yet"
            );
        }
        Err(error) => return Err(error),
    }

    match loader.subscribe(link).await {
        Ok(LinkEvent::Load(sheet)) => Ok(Some(sheet)),
        Ok(LinkEvent::Error) | Err(oneshot::Canceled) => Ok(None),
    }
}

#[derive(Debug, Clone)]
enum SheetState {
    Loaded(StyleSheet),
    Failed,
    Restricted,
}

/// In-memory [`StylesheetLoader`] keyed by each link's `href`.
#[derive(Debug)]
pub struct StylesheetRegistry {
    load_events: bool,
    sheets: RefCell<HashMap<String, SheetState>>,
    listeners: RefCell<HashMap<String, Vec<oneshot::Sender<LinkEvent>>>>,
}

impl Default for StylesheetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StylesheetRegistry {
    pub fn new() -> Self {
        Self {
            load_events: true,
            sheets: RefCell::new(HashMap::new()),
            listeners: RefCell::new(HashMap::new()),
        }
    }

    /// A platform whose link elements never fire load events.
    pub fn without_load_events() -> Self {
        Self {
            load_events: false,
            ..Self::new()
        }
    }

    /// Marks `href` as loaded and fires load at its listeners.
    pub fn finish(&self, href: &str, rules: &str) {
        let sheet = StyleSheet {
            href: href.to_string(),
            rules: rules.to_string(),
        };
        self.sheets
            .borrow_mut()
            .insert(href.to_string(), SheetState::Loaded(sheet.clone()));
        self.fire(href, LinkEvent::Load(sheet));
    }

    /// Marks `href` as failed and fires error at its listeners.
    pub fn fail(&self, href: &str) {
        self.sheets
            .borrow_mut()
            .insert(href.to_string(), SheetState::Failed);
        self.fire(href, LinkEvent::Error);
    }

    /// Makes probing `href` raise `SecurityError` until it loads.
    pub fn restrict(&self, href: &str) {
        self.sheets
            .borrow_mut()
            .insert(href.to_string(), SheetState::Restricted);
    }

    /// Number of listeners waiting on `href`.
    pub fn pending(&self, href: &str) -> usize {
        self.listeners
            .borrow()
            .get(href)
            .map_or(0, |senders| senders.len())
    }

    fn fire(&self, href: &str, event: LinkEvent) {
        let senders = self.listeners.borrow_mut().remove(href).unwrap_or_default();
        tracing::debug!(href, count = senders.len(), "firing link event");
        for sender in senders {
            // A dropped receiver means nobody waits any more.
            let _ = sender.send(event.clone());
        }
    }
}

impl<'a> StylesheetLoader<'a> for StylesheetRegistry {
    fn supports_load_events(&self) -> bool {
        self.load_events
    }

    fn sheet(&self, link: NodeRef<'a>) -> Result<Option<StyleSheet>, DomException> {
        let href = link.get_attribute("href").unwrap_or_default();
        let sheets = self.sheets.borrow();
        match sheets.get(&href) {
            Some(SheetState::Loaded(sheet)) => Ok(Some(sheet.clone())),
            Some(SheetState::Restricted) => Err(ErrorName::SecurityError.into()),
            Some(SheetState::Failed) | None => Ok(None),
        }
    }

    fn subscribe(&self, link: NodeRef<'a>) -> oneshot::Receiver<LinkEvent> {
        let href = link.get_attribute("href").unwrap_or_default();
        let (sender, receiver) = oneshot::channel();

        let terminal = match self.sheets.borrow().get(&href) {
            Some(SheetState::Loaded(sheet)) => Some(LinkEvent::Load(sheet.clone())),
            Some(SheetState::Failed) => Some(LinkEvent::Error),
            Some(SheetState::Restricted) | None => None,
        };
        match terminal {
            Some(event) => {
                let _ = sender.send(event);
            }
            None => self
                .listeners
                .borrow_mut()
                .entry(href)
                .or_default()
                .push(sender),
        }
        receiver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{Attribute, Document};
    use futures::FutureExt;

    fn link<'a>(document: Document<'a>, href: &str) -> NodeRef<'a> {
        document.create_element_with_attributes(
            "link",
            vec![
                Attribute::new("rel", "stylesheet"),
                Attribute::new("href", href),
            ],
        )
    }

    struct Broken;

    impl<'a> StylesheetLoader<'a> for Broken {
        fn sheet(&self, _link: NodeRef<'a>) -> Result<Option<StyleSheet>, DomException> {
            Err(ErrorName::InvalidStateError.into())
        }

        fn subscribe(&self, _link: NodeRef<'a>) -> oneshot::Receiver<LinkEvent> {
            oneshot::channel().1
        }
    }

    #[test]
    fn recognizes_stylesheet_links() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        assert!(is_stylesheet_link(link(document, "a.css")));

        let alternate = document.create_element_with_attributes(
            "link",
            vec![Attribute::new("rel", "Alternate StyleSheet")],
        );
        assert!(is_stylesheet_link(alternate));

        let icon =
            document.create_element_with_attributes("link", vec![Attribute::new("rel", "icon")]);
        assert!(!is_stylesheet_link(icon));
        assert!(!is_stylesheet_link(document.create_element("style")));
    }

    #[test]
    fn resolves_immediately_without_load_events() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let registry = StylesheetRegistry::without_load_events();

        let result = link_loaded(&registry, link(document, "a.css")).now_or_never();
        assert_eq!(result, Some(Ok(None)));
        assert_eq!(registry.pending("a.css"), 0);
    }

    #[test]
    fn resolves_immediately_when_already_loaded() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let registry = StylesheetRegistry::new();
        registry.finish("a.css", "p { color: red }");

        let sheet = link_loaded(&registry, link(document, "a.css"))
            .now_or_never()
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(sheet.rules, "p { color: red }");
    }

    #[test]
    fn waits_for_load() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let registry = StylesheetRegistry::new();
        let mut pending = link_loaded(&registry, link(document, "a.css")).boxed_local();

        assert!((&mut pending).now_or_never().is_none());
        assert_eq!(registry.pending("a.css"), 1);

        registry.finish("a.css", "");
        let sheet = pending.now_or_never().unwrap().unwrap();
        assert_eq!(sheet.map(|sheet| sheet.href).as_deref(), Some("a.css"));
        assert_eq!(registry.pending("a.css"), 0);
    }

    #[test]
    fn error_event_counts_as_completion() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let registry = StylesheetRegistry::new();
        let mut pending = link_loaded(&registry, link(document, "a.css")).boxed_local();
        assert!((&mut pending).now_or_never().is_none());

        registry.fail("a.css");
        assert_eq!(pending.now_or_never(), Some(Ok(None)));
    }

    #[test]
    fn access_failures_while_probing_are_ignored() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let registry = StylesheetRegistry::new();
        registry.restrict("a.css");
        let mut pending = link_loaded(&registry, link(document, "a.css")).boxed_local();
        assert!((&mut pending).now_or_never().is_none());

        registry.finish("a.css", "");
        assert!(matches!(pending.now_or_never(), Some(Ok(Some(_)))));
    }

    #[test]
    fn other_probe_errors_propagate() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let result = link_loaded(&Broken, link(document, "a.css")).now_or_never();
        assert!(matches!(
            result,
            Some(Err(error)) if error.name == ErrorName::InvalidStateError
        ));
    }

    #[test]
    fn dropped_listener_counts_as_completion() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);

        struct Forgetful;
        impl<'a> StylesheetLoader<'a> for Forgetful {
            fn sheet(&self, _link: NodeRef<'a>) -> Result<Option<StyleSheet>, DomException> {
                Ok(None)
            }
            fn subscribe(&self, _link: NodeRef<'a>) -> oneshot::Receiver<LinkEvent> {
                oneshot::channel().1
            }
        }

        let result = link_loaded(&Forgetful, link(document, "a.css")).now_or_never();
        assert_eq!(result, Some(Ok(None)));
    }
}
