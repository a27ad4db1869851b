//! Fragment parser building [`dom`] trees from markup.
//!
//! This is the "in body" subset of the HTML tree construction stage that
//! fragment parsing needs: elements nest, void elements never open, raw text
//! and escapable raw text elements switch the tokenizer, and unmatched end
//! tags are dropped.

pub mod stack_of_open_elements;

use dom::arena::NodeRef;
use dom::dom_exception::DomException;
use dom::node::Node;
use dom::serialization::VOID_ELEMENTS;
use dom::{Attribute, Document};
use tokenizer::{State, Token, Tokenizer};

use stack_of_open_elements::StackOfOpenElements;

macro_rules! log_parser_error {
    ($message:expr) => {
        tracing::trace!(target: "parser", file = file!(), line = line!(), "parse error: {}", $message);
    };
}

static RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];
static ESCAPABLE_RAW_TEXT_ELEMENTS: &[&str] = &["textarea", "title"];

// Start tags that close an open p element first.
static CLOSES_P_ELEMENT: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "dialog", "div", "dl", "fieldset",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "main", "menu", "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

pub struct Parser<'a> {
    document: Document<'a>,
    root: NodeRef<'a>,
    tokenizer: Tokenizer,
    open_elements: StackOfOpenElements<'a>,
}

impl<'a> Parser<'a> {
    /// Creates a parser that inserts into a new document fragment.
    pub fn new(document: Document<'a>, input: &str) -> Self {
        Self {
            document,
            root: document.create_document_fragment(),
            tokenizer: Tokenizer::new(input),
            open_elements: StackOfOpenElements::new(),
        }
    }

    /// Consumes the input and returns the document fragment holding the result.
    pub fn parse(mut self) -> NodeRef<'a> {
        while let Some(token) = self.tokenizer.next_token() {
            self.process_token(token);
        }
        self.root
    }

    fn current_node(&self) -> NodeRef<'a> {
        self.open_elements.current_node().unwrap_or(self.root)
    }

    fn process_token(&mut self, token: Token) {
        match token {
            Token::Character { data } => self.insert_character(data),
            Token::Comment { data } => {
                let comment = self.document.create_comment(&data);
                Node::insert(comment, self.current_node(), None);
            }
            Token::Doctype { name } => {
                log_parser_error!(format!("unexpected DOCTYPE {name:?} in fragment"));
            }
            Token::StartTag {
                name,
                self_closing,
                attributes,
            } => self.handle_start_tag(&name, self_closing, attributes),
            Token::EndTag { name } => self.handle_end_tag(&name),
            Token::EndOfFile => {
                if !self.open_elements.is_empty() {
                    tracing::trace!(
                        target: "parser",
                        open = self.open_elements.len(),
                        "end of input with open elements"
                    );
                }
            }
        }
    }

    fn handle_start_tag(
        &mut self,
        name: &str,
        self_closing: bool,
        attributes: Vec<tokenizer::Attribute>,
    ) {
        if CLOSES_P_ELEMENT.contains(&name)
            && self.open_elements.has_element_with_tag_name_in_scope("p")
        {
            self.open_elements
                .pop_elements_until_element_has_been_popped("p");
        }

        let element = self.document.create_element_with_attributes(
            name,
            attributes.into_iter().map(Attribute::from).collect(),
        );
        Node::insert(element, self.current_node(), None);

        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        if self_closing {
            log_parser_error!(format!("self-closing flag on non-void element <{name}>"));
        }

        self.open_elements.push(element);
        if RAW_TEXT_ELEMENTS.contains(&name) {
            self.tokenizer.switch_to(State::RawText);
        } else if ESCAPABLE_RAW_TEXT_ELEMENTS.contains(&name) {
            self.tokenizer.switch_to(State::RcData);
        }
    }

    fn handle_end_tag(&mut self, name: &str) {
        if !self.open_elements.has_element_with_tag_name_in_scope(name) {
            log_parser_error!(format!("end tag </{name}> without matching open element"));
            return;
        }
        if !self.current_node().is_element_with_tag(name) {
            log_parser_error!(format!("end tag </{name}> closes other open elements"));
        }
        self.open_elements
            .pop_elements_until_element_has_been_popped(name);
    }

    // https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character
    fn insert_character(&mut self, character: char) {
        let parent = self.current_node();

        // If there is a Text node immediately before the adjusted insertion location,
        // then append data to that Text node's data.
        if let Some(last) = parent.last_child().filter(|last| last.is_text()) {
            last.append_data(character.encode_utf8(&mut [0; 4]));
            return;
        }

        let text = self.document.create_text_node(character.encode_utf8(&mut [0; 4]));
        Node::insert(text, parent, None);
    }
}

/// Parses `input` into a new document fragment owned by `document`.
pub fn parse_fragment<'a>(document: Document<'a>, input: &str) -> NodeRef<'a> {
    Parser::new(document, input).parse()
}

/// Replaces the children of `node` with the result of parsing `input`.
// https://html.spec.whatwg.org/multipage/dynamic-markup-insertion.html#dom-element-innerhtml
pub fn set_inner_html<'a>(
    document: Document<'a>,
    node: NodeRef<'a>,
    input: &str,
) -> Result<(), DomException> {
    let fragment = parse_fragment(document, input);
    node.replace_children(Some(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &str) -> String {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        parse_fragment(document, input).inner_html()
    }

    #[test]
    fn nested_elements_and_text() {
        let input = "<div class=\"a\"><p>Hello <b>world</b>!</p><!-- c --></div>tail";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn coalesces_text() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let fragment = parse_fragment(document, "one two &amp; three");
        assert_eq!(fragment.children().len(), 1);
        assert_eq!(fragment.text_content(), "one two & three");
    }

    #[test]
    fn void_elements_do_not_open() {
        assert_eq!(
            round_trip("<p>a<br>b<img src=\"x.png\">c</p>"),
            "<p>a<br>b<img src=\"x.png\">c</p>"
        );
        assert_eq!(round_trip("<link rel=\"stylesheet\" href=\"a.css\"/>x"), "<link rel=\"stylesheet\" href=\"a.css\">x");
    }

    #[test]
    fn script_content_is_raw_text() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let fragment = parse_fragment(document, "<script>if (a<b && c) { x('</p>') }</script><p>after</p>");
        let scripts = fragment.get_elements_by_tag_name("script");
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].text_content(), "if (a<b && c) { x('</p>') }");
        assert_eq!(fragment.get_elements_by_tag_name("p").len(), 1);
    }

    #[test]
    fn textarea_decodes_references_but_not_tags() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let fragment = parse_fragment(document, "<textarea><b>&amp;</b></textarea>");
        let textarea = fragment.get_elements_by_tag_name("textarea")[0];
        assert_eq!(textarea.text_content(), "<b>&</b>");
        assert!(textarea.element_children().is_empty());
    }

    #[test]
    fn stray_end_tags_are_ignored() {
        assert_eq!(round_trip("a</span>b"), "ab");
        assert_eq!(round_trip("<div><span>x</div>y"), "<div><span>x</span></div>y");
    }

    #[test]
    fn block_start_tag_closes_paragraph() {
        assert_eq!(round_trip("<p>one<div>two</div>"), "<p>one</p><div>two</div>");
    }

    #[test]
    fn accented_references_decode_to_text() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let fragment = parse_fragment(document, "<p>caf&eacute; &Auml;</p>");
        assert_eq!(fragment.text_content(), "caf\u{e9} \u{c4}");
        assert_eq!(fragment.inner_html(), "<p>caf\u{e9} \u{c4}</p>");
    }

    #[test]
    fn deep_nesting_parses() {
        let depth = 20_000;
        let input = format!("{}x{}", "<span>".repeat(depth), "</span>".repeat(depth));
        assert_eq!(round_trip(&input), input);
    }

    #[test]
    fn doctype_is_dropped() {
        assert_eq!(round_trip("<!DOCTYPE html><p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn set_inner_html_replaces_children() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let host = document.create_element("div");
        host.append_child(document.create_text_node("old")).unwrap();

        set_inner_html(document, host, "<em>new</em>").unwrap();
        assert_eq!(host.inner_html(), "<em>new</em>");
        assert!(host.first_child().unwrap().is_element_with_tag("em"));
    }
}
