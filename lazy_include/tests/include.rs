mod common;

use common::Harness;
use dom::{Attribute, Document, ErrorName};
use futures::channel::oneshot;
use lazy_include::{
    IncludeConfig, IncludeElement, IncludeError, Platform, RequestMode, Response, RunOutcome,
    RunState, StylesheetRegistry,
};
use typed_arena::Arena;

#[tokio::test]
async fn includes_markup_into_shadow_root() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/fragment.html", "<h1>Included</h1><p>text</p>");

    let outcome = harness.element.set_source("/fragment.html").await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.element.content_html(), "<h1>Included</h1><p>text</p>");
    assert_eq!(
        harness.element.shadow_root().inner_html(),
        "<style>:host { display: block; }</style><h1>Included</h1><p>text</p>"
    );
    assert_eq!(harness.loaded_sources(), vec!["/fragment.html"]);
    assert!(!harness.loads.borrow()[0].bubbles);
    assert_eq!(harness.element.state(), RunState::Settled);
}

#[tokio::test]
async fn preserves_light_content_in_shadow_mode() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let host = document.create_element("lazy-html-include");
    let slotted = document.create_element("em");
    slotted.append_child(document.create_text_node("slotted")).unwrap();
    host.append_child(slotted).unwrap();
    let harness = Harness::with_host(
        document,
        host,
        StylesheetRegistry::new(),
        IncludeConfig::default(),
    );
    harness.fetcher.respond("/frame.html", "<header><slot></slot></header>");

    harness.element.set_source("/frame.html").await.unwrap();

    assert_eq!(host.inner_html(), "<em>slotted</em>");
    let slot = harness.element.shadow_root().get_elements_by_tag_name("slot")[0];
    assert_eq!(slot.assigned_nodes().len(), 1);
    assert!(dom::Node::are_same(slot.assigned_nodes()[0], slotted));
}

#[tokio::test]
async fn replaces_light_content_in_light_mode() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let host = document.create_element_with_attributes(
        "lazy-html-include",
        vec![Attribute::new("no-shadow", "")],
    );
    host.append_child(document.create_text_node("placeholder"))
        .unwrap();
    let harness = Harness::with_host(
        document,
        host,
        StylesheetRegistry::new(),
        IncludeConfig::default(),
    );
    harness.fetcher.respond(
        "/light.html",
        "<link rel=\"stylesheet\" href=\"never.css\"><p>light</p>",
    );

    let outcome = harness.element.set_source("/light.html").await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(
        host.inner_html(),
        "<link rel=\"stylesheet\" href=\"never.css\"><p>light</p>"
    );
    assert_eq!(harness.element.content_html(), host.inner_html());
    assert_eq!(
        harness.element.shadow_root().inner_html(),
        "<style>:host { display: block; }</style><slot></slot>"
    );
    // Light mode leaves the fragment's resources to the surrounding document.
    assert_eq!(harness.stylesheets.pending("never.css"), 0);
}

#[tokio::test]
async fn content_follows_the_mode_of_the_last_mount() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/a.html", "<p>a</p>");
    harness.element.set_source("/a.html").await.unwrap();

    harness.element.set_no_shadow(true);
    assert_eq!(harness.element.content_html(), "<p>a</p>");
    assert_eq!(harness.element.host().inner_html(), "");

    harness.element.set_source("/a.html").await.unwrap();
    assert_eq!(harness.element.host().inner_html(), "<p>a</p>");

    harness.element.set_no_shadow(false);
    assert_eq!(harness.element.content_html(), "<p>a</p>");
    assert_eq!(
        harness.element.shadow_root().inner_html(),
        "<style>:host { display: block; }</style><slot></slot>"
    );
}

#[tokio::test]
async fn only_the_last_source_loads() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    let gate_a = harness.fetcher.gate("a.html");
    harness.fetcher.respond("b.html", "<p>B</p>");

    let run_a = harness.element.set_source("a.html");
    let run_b = harness.element.set_source("b.html");
    let (a, b) = futures::join!(run_a, async {
        let b = run_b.await;
        let _ = gate_a.send(Response::with_body("<p>A</p>"));
        b
    });

    assert_eq!(a.unwrap(), RunOutcome::Superseded);
    assert_eq!(b.unwrap(), RunOutcome::Loaded);
    assert_eq!(harness.loaded_sources(), vec!["b.html"]);
    assert_eq!(harness.element.content_html(), "<p>B</p>");
}

#[tokio::test]
async fn superseded_run_resolving_first_does_not_mount() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    let gate_a = harness.fetcher.gate("a.html");
    let gate_b = harness.fetcher.gate("b.html");

    let run_a = harness.element.set_source("a.html");
    let run_b = harness.element.set_source("b.html");
    let (a, b, ()) = futures::join!(run_a, run_b, async {
        let _ = gate_a.send(Response::with_body("<p>A</p>"));
        let _ = gate_b.send(Response::with_body("<p>B</p>"));
    });

    assert_eq!(a.unwrap(), RunOutcome::Superseded);
    assert_eq!(b.unwrap(), RunOutcome::Loaded);
    assert_eq!(harness.loaded_sources(), vec!["b.html"]);
    assert_eq!(harness.element.content_html(), "<p>B</p>");
}

#[tokio::test]
async fn deeply_nested_fragment_mounts() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    let depth = 20_000;
    let markup = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
    harness.fetcher.respond("/deep.html", &markup);

    let outcome = harness.element.set_source("/deep.html").await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.element.content_html(), markup);
    assert_eq!(harness.element.shadow_root().text_content(), "x");
}

#[tokio::test]
async fn character_references_mount_as_text() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness
        .fetcher
        .respond("/cafe.html", "<p>caf&eacute; &Auml; &copy 2024</p>");

    harness.element.set_source("/cafe.html").await.unwrap();

    let paragraph = harness.element.shadow_root().get_elements_by_tag_name("p")[0];
    assert_eq!(paragraph.text_content(), "caf\u{e9} \u{c4} \u{a9} 2024");
    assert_eq!(
        harness.element.content_html(),
        "<p>caf\u{e9} \u{c4} \u{a9} 2024</p>"
    );
}

#[tokio::test]
async fn failed_fragment_fetch_mounts_nothing_and_still_loads() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/ok.html", "<p>old</p>");
    harness.element.set_source("/ok.html").await.unwrap();

    harness
        .fetcher
        .status("/missing.html", 404, "Not Found");
    let outcome = harness.element.set_source("/missing.html").await.unwrap();
    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.element.content_html(), "");

    harness.fetcher.fail("/offline.html", "connection refused");
    let outcome = harness.element.set_source("/offline.html").await.unwrap();
    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(
        harness.loaded_sources(),
        vec!["/ok.html", "/missing.html", "/offline.html"]
    );
}

#[tokio::test]
async fn request_mode_is_read_per_request() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/a.html", "<p>a</p>");

    harness.element.set_source("/a.html").await.unwrap();
    harness.element.set_request_mode(RequestMode::SameOrigin);
    // Changing the mode alone does not fetch again.
    assert_eq!(harness.fetcher.requests().len(), 1);

    harness.element.set_source("/a.html").await.unwrap();
    assert_eq!(
        harness.fetcher.requests(),
        vec![
            ("/a.html".to_string(), RequestMode::Cors),
            ("/a.html".to_string(), RequestMode::SameOrigin),
        ]
    );

    let outcome = harness
        .element
        .set_attribute("request-mode", "no-cors")
        .await
        .unwrap();
    assert_eq!(outcome, RunOutcome::Ignored);
    assert_eq!(harness.fetcher.requests().len(), 2);
}

#[tokio::test]
async fn removing_source_does_nothing() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/a.html", "<p>a</p>");
    harness.element.set_source("/a.html").await.unwrap();

    let outcome = harness.element.remove_attribute("source").await.unwrap();

    assert_eq!(outcome, RunOutcome::Ignored);
    assert_eq!(harness.element.content_html(), "<p>a</p>");
    assert_eq!(harness.loaded_sources(), vec!["/a.html"]);
}

#[tokio::test]
async fn upgrade_loads_existing_source() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let host = document.create_element_with_attributes(
        "lazy-html-include",
        vec![
            Attribute::new("source", "/upgraded.html"),
            Attribute::new("delegates-focus", ""),
        ],
    );
    let harness = Harness::with_host(
        document,
        host,
        StylesheetRegistry::new(),
        IncludeConfig::default(),
    );
    harness.fetcher.respond("/upgraded.html", "<button>go</button>");
    assert!(harness.element.delegates_focus());
    assert!(harness.fetcher.requests().is_empty());

    let outcome = harness.element.upgrade().await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.element.content_html(), "<button>go</button>");
}

#[tokio::test]
async fn upgrade_without_source_is_ignored() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    assert_eq!(harness.element.upgrade().await.unwrap(), RunOutcome::Ignored);
    assert!(harness.fetcher.requests().is_empty());
}

#[tokio::test]
async fn once_loaded_resolves_with_the_next_load() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/a.html", "<p>a</p>");
    let loaded: oneshot::Receiver<_> = harness.element.once_loaded();

    harness.element.set_source("/a.html").await.unwrap();

    let event = loaded.await.unwrap();
    assert_eq!(event.source, "/a.html");
    assert!(!event.bubbles);
}

#[tokio::test]
async fn custom_config_applies() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let config = IncludeConfig::from_toml_str(
        r#"
        tag_name = "site-include"
        default_request_mode = "same-origin"
        base_style = "<style>:host { display: contents; }</style>"
        "#,
    )
    .unwrap();
    let host = document.create_element("site-include");
    let harness = Harness::with_host(document, host, StylesheetRegistry::new(), config);
    harness.fetcher.respond("/a.html", "<p>a</p>");

    harness.element.set_source("/a.html").await.unwrap();

    assert_eq!(harness.element.definition().name, "site-include");
    assert_eq!(
        harness.fetcher.requests(),
        vec![("/a.html".to_string(), RequestMode::SameOrigin)]
    );
    assert_eq!(
        harness.element.shadow_root().inner_html(),
        "<style>:host { display: contents; }</style><p>a</p>"
    );
    assert_eq!(harness.element.content_html(), "<p>a</p>");
}

#[test]
fn shadow_root_is_attached_once() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let harness = Harness::new(document);
    let platform = Platform {
        fetch: harness.fetcher.clone(),
        stylesheets: harness.stylesheets.clone(),
        scripts: harness.scripts.clone(),
    };

    let second = IncludeElement::new(
        document,
        harness.element.host(),
        platform,
        IncludeConfig::default(),
    );

    assert!(matches!(
        second,
        Err(IncludeError::Dom(error)) if error.name == ErrorName::NotSupportedError
    ));
}
