//! Property-based tests for mounted content.

mod common;

use common::Harness;
use dom::Document;
use lazy_include::RunOutcome;
use proptest::prelude::*;
use typed_arena::Arena;

fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,!?'-]{1,12}"
}

fn piece() -> impl Strategy<Value = String> {
    prop_oneof![
        text(),
        text().prop_map(|text| format!("<p>{text}</p>")),
        text().prop_map(|text| format!("<span class=\"note\">{text}</span>")),
        text().prop_map(|text| format!("<section><h2>{text}</h2><em>{text}</em></section>")),
        "[a-z ]{1,8}".prop_map(|text| format!("<!--{text}-->")),
        Just("<br>".to_string()),
        Just("<img src=\"a.png\" alt=\"\">".to_string()),
    ]
}

fn fragment() -> impl Strategy<Value = String> {
    prop::collection::vec(piece(), 0..8).prop_map(|pieces| pieces.concat())
}

fn mount(markup: &str, no_shadow: bool) -> String {
    let arena = Arena::new();
    let harness = Harness::new(Document::new(&arena));
    harness.element.set_no_shadow(no_shadow);
    harness.fetcher.respond("/fragment.html", markup);

    let outcome = futures::executor::block_on(harness.element.set_source("/fragment.html"));
    assert_eq!(outcome.unwrap(), RunOutcome::Loaded);
    harness.element.content_html()
}

proptest! {
    #[test]
    fn shadow_content_equals_fetched_text(markup in fragment()) {
        prop_assert_eq!(mount(&markup, false), markup);
    }

    #[test]
    fn light_content_equals_fetched_text(markup in fragment()) {
        prop_assert_eq!(mount(&markup, true), markup);
    }
}
