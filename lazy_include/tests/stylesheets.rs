mod common;

use common::Harness;
use dom::Document;
use lazy_include::{IncludeConfig, RunOutcome, StylesheetRegistry};
use typed_arena::Arena;

const STYLED: &str = "<link rel=\"stylesheet\" href=\"a.css\">\
                      <link rel=\"stylesheet\" href=\"b.css\">\
                      <p>styled</p>";

#[tokio::test]
async fn load_waits_for_every_stylesheet() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/styled.html", STYLED);

    let mut run = harness.element.set_source("/styled.html");
    assert!(futures::poll!(&mut run).is_pending());
    assert_eq!(harness.element.content_html(), STYLED);
    assert_eq!(harness.stylesheets.pending("a.css"), 1);
    assert_eq!(harness.stylesheets.pending("b.css"), 1);

    harness.stylesheets.finish("a.css", "p { color: red }");
    assert!(futures::poll!(&mut run).is_pending());
    assert!(harness.loaded_sources().is_empty());

    harness.stylesheets.finish("b.css", "p { margin: 0 }");
    assert_eq!(run.await.unwrap(), RunOutcome::Loaded);
    assert_eq!(harness.loaded_sources(), vec!["/styled.html"]);
}

#[tokio::test]
async fn failed_stylesheet_still_completes() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/styled.html", STYLED);
    harness.stylesheets.finish("a.css", "");

    let mut run = harness.element.set_source("/styled.html");
    assert!(futures::poll!(&mut run).is_pending());
    assert_eq!(harness.stylesheets.pending("a.css"), 0);

    harness.stylesheets.fail("b.css");
    assert_eq!(run.await.unwrap(), RunOutcome::Loaded);
}

#[tokio::test]
async fn inaccessible_sheet_is_treated_as_loading() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond(
        "/restricted.html",
        "<link rel=\"stylesheet\" href=\"https://cdn.test/x.css\"><p>x</p>",
    );
    harness.stylesheets.restrict("https://cdn.test/x.css");

    let mut run = harness.element.set_source("/restricted.html");
    assert!(futures::poll!(&mut run).is_pending());

    harness.stylesheets.finish("https://cdn.test/x.css", "");
    assert_eq!(run.await.unwrap(), RunOutcome::Loaded);
}

#[tokio::test]
async fn platform_without_link_events_loads_immediately() {
    let arena = Arena::new();
    let document = Document::new(&arena);
    let host = document.create_element("lazy-html-include");
    let harness = Harness::with_host(
        document,
        host,
        StylesheetRegistry::without_load_events(),
        IncludeConfig::default(),
    );
    harness.fetcher.respond("/styled.html", STYLED);

    let outcome = harness.element.set_source("/styled.html").await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.stylesheets.pending("a.css"), 0);
}

#[tokio::test]
async fn other_links_are_not_awaited() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond(
        "/icons.html",
        "<link rel=\"icon\" href=\"favicon.ico\"><link rel=\"preload\" href=\"font.woff2\">",
    );

    let outcome = harness.element.set_source("/icons.html").await.unwrap();

    assert_eq!(outcome, RunOutcome::Loaded);
    assert_eq!(harness.stylesheets.pending("favicon.ico"), 0);
}

#[tokio::test]
async fn source_change_while_waiting_for_styles_supersedes() {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.fetcher.respond("/styled.html", STYLED);
    harness.fetcher.respond("/plain.html", "<p>plain</p>");

    let mut styled = harness.element.set_source("/styled.html");
    assert!(futures::poll!(&mut styled).is_pending());

    let plain = harness.element.set_source("/plain.html").await.unwrap();
    assert_eq!(plain, RunOutcome::Loaded);

    harness.stylesheets.finish("a.css", "");
    harness.stylesheets.finish("b.css", "");
    assert_eq!(styled.await.unwrap(), RunOutcome::Superseded);
    assert_eq!(harness.loaded_sources(), vec!["/plain.html"]);
    assert_eq!(harness.element.content_html(), "<p>plain</p>");
}
