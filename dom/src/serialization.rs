//! HTML fragment serialization.
//!
//! https://html.spec.whatwg.org/multipage/parsing.html#serialising-html-fragments

use crate::node::{CharacterDataVariant, Node, NodeData};

pub static VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

static RAW_TEXT_PARENTS: &[&str] = &[
    "style",
    "script",
    "xmp",
    "iframe",
    "noembed",
    "noframes",
    "plaintext",
];

impl<'a> Node<'a> {
    /// Serializes the children of this node.
    pub fn inner_html(&self) -> String {
        let mut output = String::new();
        let mut stack = Vec::new();
        push_children(&mut stack, self);
        serialize(stack, &mut output);
        output
    }

    /// Serializes this node and its children.
    pub fn outer_html(&self) -> String {
        let mut output = String::new();
        serialize(vec![Step::Node(self)], &mut output);
        output
    }
}

// Pending work for the serializer. Trees can nest deeper than the call
// stack allows, so the walk keeps its own stack.
enum Step<'n, 'a> {
    Node(&'n Node<'a>),
    EndTag(&'n str),
}

fn push_children<'n, 'a: 'n>(stack: &mut Vec<Step<'n, 'a>>, node: &Node<'a>) {
    stack.extend(node.children().iter().rev().map(|child| Step::Node(*child)));
}

fn serialize<'n, 'a: 'n>(mut stack: Vec<Step<'n, 'a>>, output: &mut String) {
    while let Some(step) = stack.pop() {
        let node = match step {
            Step::Node(node) => node,
            Step::EndTag(local_name) => {
                output.push_str("</");
                output.push_str(local_name);
                output.push('>');
                continue;
            }
        };

        match &node.data {
            NodeData::Element {
                local_name,
                attributes,
            } => {
                output.push('<');
                output.push_str(local_name);
                for attribute in attributes.borrow().iter() {
                    output.push(' ');
                    output.push_str(&attribute.name);
                    output.push_str("=\"");
                    output.push_str(&escape(&attribute.value, true));
                    output.push('"');
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&local_name.as_str()) {
                    continue;
                }

                stack.push(Step::EndTag(local_name.as_str()));
                push_children(&mut stack, node);
            }
            NodeData::CharacterData {
                data,
                variant: CharacterDataVariant::Text,
            } => {
                let raw = node
                    .parent()
                    .is_some_and(|parent| parent.is_element_with_one_of_tags(RAW_TEXT_PARENTS));
                match raw {
                    true => output.push_str(&data.borrow()),
                    false => output.push_str(&escape(&data.borrow(), false)),
                }
            }
            NodeData::CharacterData {
                data,
                variant: CharacterDataVariant::Comment,
            } => {
                output.push_str("<!--");
                output.push_str(&data.borrow());
                output.push_str("-->");
            }
            NodeData::Document | NodeData::DocumentFragment | NodeData::ShadowRoot { .. } => {
                push_children(&mut stack, node);
            }
        }
    }
}

// https://html.spec.whatwg.org/multipage/parsing.html#escapingString
fn escape(string: &str, attribute_mode: bool) -> String {
    let mut escaped = String::with_capacity(string.len());
    for character in string.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '\u{00a0}' => escaped.push_str("&nbsp;"),
            '"' if attribute_mode => escaped.push_str("&quot;"),
            '<' if !attribute_mode => escaped.push_str("&lt;"),
            '>' if !attribute_mode => escaped.push_str("&gt;"),
            _ => escaped.push(character),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::Attribute;

    #[test]
    fn serializes_elements_text_and_comments() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let div = document.create_element_with_attributes(
            "div",
            vec![Attribute::new("title", "a \"b\" & c")],
        );
        div.append_child(document.create_text_node("1 < 2 & 3 > 2"))
            .unwrap();
        div.append_child(document.create_element("br")).unwrap();
        div.append_child(document.create_comment(" note ")).unwrap();

        assert_eq!(
            div.outer_html(),
            "<div title=\"a &quot;b&quot; &amp; c\">1 &lt; 2 &amp; 3 &gt; 2<br><!-- note --></div>"
        );
        assert_eq!(div.inner_html(), "1 &lt; 2 &amp; 3 &gt; 2<br><!-- note -->");
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let script = document.create_element("script");
        script
            .append_child(document.create_text_node("if (a < b && c) {}"))
            .unwrap();

        assert_eq!(script.outer_html(), "<script>if (a < b && c) {}</script>");
    }

    #[test]
    fn deeply_nested_trees_serialize() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let root = document.create_element("div");
        let mut parent = root;
        for _ in 0..20_000 {
            let span = document.create_element("span");
            parent.append_child(span).unwrap();
            parent = span;
        }
        parent.append_child(document.create_text_node("x")).unwrap();

        let html = root.inner_html();
        assert!(html.starts_with("<span><span>"));
        assert!(html.ends_with("x</span></span>"));
        assert_eq!(html.len(), 20_000 * "<span></span>".len() + 1);
        assert_eq!(root.descendants().len(), 20_001);
        assert_eq!(root.text_content(), "x");
    }
}
