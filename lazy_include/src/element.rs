//! The include element and its load pipeline.
//!
//! Setting `source` starts a run: fetch the markup, mount it, wait for the
//! fragment's stylesheets, run its scripts, then fire `load`. Runs are not
//! cancelled. A run whose `source` has since changed notices at its next
//! check and stops without touching the tree again, so only the latest
//! `source` can mount content and fire `load`.

use std::cell::Cell;
use std::rc::Rc;

use dom::custom_element_definition::CustomElementDefinition;
use dom::{Document, Node, NodeRef, ShadowRootInit, ShadowRootMode};
use futures::channel::oneshot;
use futures::future::{try_join_all, LocalBoxFuture};
use futures::FutureExt;
use tracing::Instrument;

use crate::config::IncludeConfig;
use crate::error::Result;
use crate::event::{EventTarget, EventType, LoadEvent};
use crate::fetch::{fetch_text, Fetch, RequestInit, RequestMode};
use crate::script::{ExecutionContext, ScriptExecutor};
use crate::stylesheet::{is_stylesheet_link, link_loaded, StylesheetLoader};

pub const SOURCE: &str = "source";
pub const REQUEST_MODE: &str = "request-mode";
pub const NO_SHADOW: &str = "no-shadow";
pub const SCOPE_SCRIPTS: &str = "scope-scripts";
pub const DELEGATES_FOCUS: &str = "delegates-focus";

pub static OBSERVED_ATTRIBUTES: &[&str] = &[SOURCE, REQUEST_MODE, NO_SHADOW];

/// How an attribute change was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The fragment was mounted and `load` fired.
    Loaded,
    /// `source` changed while the run was in flight.
    Superseded,
    /// The change does not start a run.
    Ignored,
}

/// Where the most recent current run got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Fetching,
    Mounting,
    WaitingForStyles,
    ExecutingScripts,
    Settled,
}

/// The collaborators an include element reaches the outside world through.
#[derive(Clone)]
pub struct Platform<'a> {
    pub fetch: Rc<dyn Fetch + 'a>,
    pub stylesheets: Rc<dyn StylesheetLoader<'a> + 'a>,
    pub scripts: Rc<dyn ScriptExecutor<'a> + 'a>,
}

pub struct IncludeElement<'a> {
    document: Document<'a>,
    host: NodeRef<'a>,
    shadow_root: NodeRef<'a>,
    platform: Platform<'a>,
    config: IncludeConfig,
    events: EventTarget<'a>,
    state: Cell<RunState>,
    // Leading shadow root children that came from the base style.
    base_nodes: Cell<usize>,
    // Whether the last mount went into the host's children.
    mounted_light: Cell<bool>,
}

impl<'a> IncludeElement<'a> {
    /// Wraps `host`, attaching its shadow root and mounting the base style.
    ///
    /// Attributes already on `host` take effect through [`IncludeElement::upgrade`].
    pub fn new(
        document: Document<'a>,
        host: NodeRef<'a>,
        platform: Platform<'a>,
        config: IncludeConfig,
    ) -> Result<Self> {
        let init = ShadowRootInit {
            mode: ShadowRootMode::Open,
            delegates_focus: host.has_attribute(DELEGATES_FOCUS),
        };
        let shadow_root = document.attach_shadow(host, init)?;
        tracing::debug!(
            tag = host.element_tag_name().unwrap_or_default(),
            delegates_focus = init.delegates_focus,
            "attached include shadow root"
        );

        let element = Self {
            document,
            host,
            shadow_root,
            platform,
            config,
            events: EventTarget::default(),
            state: Cell::new(RunState::Idle),
            base_nodes: Cell::new(0),
            mounted_light: Cell::new(host.has_attribute(NO_SHADOW)),
        };
        let base = element.base_style();
        element.shadow_root.replace_children(Some(base))?;
        Ok(element)
    }

    /// Creates a fresh host element named after `config.tag_name` and wraps it.
    pub fn create(document: Document<'a>, platform: Platform<'a>, config: IncludeConfig) -> Result<Self> {
        let host = document.create_element(&config.tag_name);
        Self::new(document, host, platform, config)
    }

    pub fn definition(&self) -> CustomElementDefinition {
        CustomElementDefinition::new(&self.config.tag_name, OBSERVED_ATTRIBUTES)
    }

    pub fn host(&self) -> NodeRef<'a> {
        self.host
    }

    pub fn shadow_root(&self) -> NodeRef<'a> {
        self.shadow_root
    }

    pub fn config(&self) -> &IncludeConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    pub fn source(&self) -> Option<String> {
        self.host.get_attribute(SOURCE)
    }

    /// Sets `source`, which starts a run.
    pub fn set_source(&self, value: &str) -> LocalBoxFuture<'_, Result<RunOutcome>> {
        self.set_attribute(SOURCE, value)
    }

    /// The mode requests are issued with.
    ///
    /// Unrecognized values fall back to the configured default.
    pub fn request_mode(&self) -> RequestMode {
        let Some(value) = self.host.get_attribute(REQUEST_MODE) else {
            return self.config.default_request_mode;
        };
        match value.parse() {
            Ok(mode) => mode,
            Err(error) => {
                tracing::warn!(
                    %error,
                    default = %self.config.default_request_mode,
                    "ignoring request-mode attribute"
                );
                self.config.default_request_mode
            }
        }
    }

    /// Changes the mode for later requests without fetching again.
    pub fn set_request_mode(&self, mode: RequestMode) {
        self.host.set_attribute(REQUEST_MODE, mode.as_str());
    }

    pub fn no_shadow(&self) -> bool {
        self.host.has_attribute(NO_SHADOW)
    }

    /// Takes effect at the next run.
    pub fn set_no_shadow(&self, value: bool) {
        self.host.toggle_attribute(NO_SHADOW, value);
    }

    pub fn scope_scripts(&self) -> bool {
        self.host.has_attribute(SCOPE_SCRIPTS)
    }

    pub fn set_scope_scripts(&self, value: bool) {
        self.host.toggle_attribute(SCOPE_SCRIPTS, value);
    }

    /// The value the shadow root was created with.
    pub fn delegates_focus(&self) -> bool {
        self.shadow_root.delegates_focus()
    }

    /// Sets an attribute on the host and runs the matching reaction.
    pub fn set_attribute(&self, name: &str, value: &str) -> LocalBoxFuture<'_, Result<RunOutcome>> {
        let old_value = self.host.set_attribute(name, value);
        let name = name.to_ascii_lowercase();
        let value = value.to_string();
        async move {
            self.attribute_changed_callback(&name, old_value.as_deref(), Some(&value))
                .await
        }
        .boxed_local()
    }

    /// Removes an attribute from the host and runs the matching reaction.
    pub fn remove_attribute(&self, name: &str) -> LocalBoxFuture<'_, Result<RunOutcome>> {
        let old_value = self.host.remove_attribute(name);
        let name = name.to_ascii_lowercase();
        async move {
            self.attribute_changed_callback(&name, old_value.as_deref(), None)
                .await
        }
        .boxed_local()
    }

    /// Reaction to a change of one of the host's attributes.
    ///
    /// Only a new `source` value starts a run, everything else is read when
    /// a run needs it.
    pub async fn attribute_changed_callback(
        &self,
        name: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
    ) -> Result<RunOutcome> {
        if !self.definition().observes(name) {
            return Ok(RunOutcome::Ignored);
        }
        match (name, new_value) {
            (SOURCE, Some(source)) => {
                tracing::debug!(source, old = old_value, "source changed");
                self.run(source).await
            }
            _ => Ok(RunOutcome::Ignored),
        }
    }

    /// Runs the reactions for attributes present before the element existed.
    pub async fn upgrade(&self) -> Result<RunOutcome> {
        match self.source() {
            Some(source) => {
                self.attribute_changed_callback(SOURCE, None, Some(&source))
                    .await
            }
            None => Ok(RunOutcome::Ignored),
        }
    }

    pub fn add_event_listener(&self, event_type: EventType, listener: impl Fn(&LoadEvent) + 'a) {
        self.events.add_event_listener(event_type, Rc::new(listener));
    }

    /// Resolves with the next `load` event.
    pub fn once_loaded(&self) -> oneshot::Receiver<LoadEvent> {
        self.events.once()
    }

    /// Serialization of the mounted fragment.
    ///
    /// After a light mount this is the host's children, otherwise the shadow
    /// root's children after the base style. Toggling `no-shadow` has no effect
    /// until the next mount.
    pub fn content_html(&self) -> String {
        if self.mounted_light.get() {
            return self.host.inner_html();
        }
        self.shadow_root
            .children()
            .iter()
            .skip(self.base_nodes.get())
            .map(|node| node.outer_html())
            .collect()
    }

    fn is_stale(&self, source: &str) -> bool {
        self.source().as_deref() != Some(source)
    }

    fn transition(&self, source: &str, state: RunState) {
        tracing::debug!(source, ?state, "include run");
        self.state.set(state);
    }

    fn base_style(&self) -> NodeRef<'a> {
        let base = parser::parse_fragment(self.document, &self.config.base_style);
        self.base_nodes.set(base.children().len());
        base
    }

    async fn run(&self, source: &str) -> Result<RunOutcome> {
        let span = tracing::info_span!("include", source);
        self.run_pipeline(source).instrument(span).await
    }

    async fn run_pipeline(&self, source: &str) -> Result<RunOutcome> {
        self.transition(source, RunState::Fetching);
        let mode = self.request_mode();
        tracing::info!(mode = %mode, "fetching fragment");
        let text = match fetch_text(&*self.platform.fetch, source, &RequestInit { mode }).await {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(%error, "fragment fetch failed");
                String::new()
            }
        };

        if self.is_stale(source) {
            tracing::debug!("superseded before mounting");
            return Ok(RunOutcome::Superseded);
        }

        self.transition(source, RunState::Mounting);
        let no_shadow = self.no_shadow();
        self.mount(&text, no_shadow)?;

        // In light mode the surrounding document owns the fragment's resources.
        if !no_shadow {
            self.transition(source, RunState::WaitingForStyles);
            self.settle_stylesheets().await?;
            if self.is_stale(source) {
                tracing::debug!("superseded while waiting for stylesheets");
                return Ok(RunOutcome::Superseded);
            }

            self.transition(source, RunState::ExecutingScripts);
            if self.execute_scripts(source).await? == RunOutcome::Superseded {
                return Ok(RunOutcome::Superseded);
            }
        }

        if self.is_stale(source) {
            tracing::debug!("superseded before load");
            return Ok(RunOutcome::Superseded);
        }
        self.transition(source, RunState::Settled);
        tracing::info!("fragment loaded");
        self.events.dispatch(&LoadEvent::new(source));
        Ok(RunOutcome::Loaded)
    }

    fn mount(&self, text: &str, no_shadow: bool) -> Result<()> {
        if no_shadow {
            parser::set_inner_html(self.document, self.host, text)?;
        }

        let content = self.base_style();
        let body = match no_shadow {
            true => "<slot></slot>",
            false => text,
        };
        Node::append(parser::parse_fragment(self.document, body), content)?;
        self.shadow_root.replace_children(Some(content))?;
        self.mounted_light.set(no_shadow);
        Ok(())
    }

    async fn settle_stylesheets(&self) -> Result<()> {
        let links: Vec<NodeRef<'a>> = self
            .shadow_root
            .descendants()
            .into_iter()
            .filter(|node| is_stylesheet_link(node))
            .collect();
        tracing::debug!(count = links.len(), "waiting for stylesheets");

        let loader = &*self.platform.stylesheets;
        try_join_all(links.into_iter().map(|link| link_loaded(loader, link))).await?;
        Ok(())
    }

    async fn execute_scripts(&self, source: &str) -> Result<RunOutcome> {
        let scripts = self.shadow_root.get_elements_by_tag_name("script");
        tracing::debug!(
            count = scripts.len(),
            external = ?scripts.iter().filter_map(|script| script.get_attribute("src")).collect::<Vec<_>>(),
            "collected scripts"
        );

        for script in scripts {
            let text = match script.get_attribute("src").filter(|src| !src.is_empty()) {
                Some(src) => {
                    let init = RequestInit {
                        mode: self.request_mode(),
                    };
                    let fetched = fetch_text(&*self.platform.fetch, &src, &init).await;
                    if self.is_stale(source) {
                        tracing::debug!(src = %src, "superseded while fetching script");
                        return Ok(RunOutcome::Superseded);
                    }
                    match fetched {
                        Ok(text) => text,
                        Err(error) => {
                            tracing::error!(%error, src = %src, "script fetch failed");
                            return Err(error.into());
                        }
                    }
                }
                None => script.text_content(),
            };

            if self.is_stale(source) {
                return Ok(RunOutcome::Superseded);
            }
            let context = match self.scope_scripts() {
                true => ExecutionContext::Element(self.host),
                false => ExecutionContext::Global,
            };
            self.platform.scripts.execute(&text, context)?;
        }
        Ok(RunOutcome::Loaded)
    }
}

impl<'a> std::fmt::Debug for IncludeElement<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncludeElement")
            .field("source", &self.source())
            .field("state", &self.state.get())
            .field("config", &self.config)
            .finish()
    }
}
