//! # lazy_include
//!
//! An element that fetches a fragment of markup and splices it into its
//! document, either into its own shadow root or into its children.
//!
//! - [`IncludeElement`] drives the load pipeline off `source` changes
//! - [`stylesheet::link_loaded`] waits for the fragment's stylesheets
//! - [`Fetch`], [`StylesheetLoader`] and [`ScriptExecutor`] are the ports the
//!   element reaches the network, the style engine and the script engine through
//!
//! The `http` feature adds `http::HttpFetcher`, a [`Fetch`] built on `reqwest`.

pub mod config;
pub mod element;
pub mod error;
pub mod event;
pub mod fetch;
#[cfg(feature = "http")]
pub mod http;
pub mod script;
pub mod stylesheet;

pub use config::IncludeConfig;
pub use element::{IncludeElement, Platform, RunOutcome, RunState};
pub use error::{ConfigError, FetchError, IncludeError, Result, ScriptError};
pub use event::{EventType, LoadEvent};
pub use fetch::{Fetch, RequestInit, RequestMode, Response};
pub use script::{DenyScripts, ExecutionContext, ScriptExecutor};
pub use stylesheet::{LinkEvent, StyleSheet, StylesheetLoader, StylesheetRegistry};
