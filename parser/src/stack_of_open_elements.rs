use dom::arena::NodeRef;
use dom::node::Node;

#[derive(Debug, Clone, Default)]
pub struct StackOfOpenElements<'a> {
    pub elements: Vec<NodeRef<'a>>,
}

static BASE_SCOPE_ELEMENTS: &[&str] = &[
    "applet", "caption", "html", "table", "td", "th", "marquee", "object", "template",
];

impl<'a> StackOfOpenElements<'a> {
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
        }
    }

    // https://html.spec.whatwg.org/multipage/parsing.html#current-node
    pub fn current_node(&self) -> Option<NodeRef<'a>> {
        self.elements.last().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn push(&mut self, element: NodeRef<'a>) {
        self.elements.push(element);
    }

    pub fn pop_current_element(&mut self) -> Option<NodeRef<'a>> {
        self.elements.pop()
    }

    pub fn pop_elements_until_element_has_been_popped(&mut self, tag_name: &str) {
        while let Some(element) = self.pop_current_element() {
            if element.is_element_with_tag(tag_name) {
                return;
            }
        }
    }

    pub fn contains(&self, element: NodeRef<'a>) -> bool {
        self.elements
            .iter()
            .any(|open| Node::are_same(*open, element))
    }

    // https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope
    fn has_tag_name_in_scope(&self, target: &str, list: &[&str]) -> bool {
        // 1. Initialize node to be the current node (the bottommost node of the stack).
        for node in self.elements.iter().rev() {
            // 2. If node is the target node, terminate in a match state.
            if node.is_element_with_tag(target) {
                return true;
            }
            // 3. Otherwise, if node is one of the element types in list, terminate in a failure state.
            if node.is_element_with_one_of_tags(list) {
                return false;
            }
        }
        // A fragment has no html element at the top of the stack.
        false
    }

    // https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-scope
    pub fn has_element_with_tag_name_in_scope(&self, tag_name: &str) -> bool {
        self.has_tag_name_in_scope(tag_name, BASE_SCOPE_ELEMENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::Document;

    #[test]
    fn scope_stops_at_boundaries() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let mut stack = StackOfOpenElements::new();
        stack.push(document.create_element("div"));
        stack.push(document.create_element("table"));
        stack.push(document.create_element("span"));

        assert!(stack.has_element_with_tag_name_in_scope("span"));
        assert!(stack.has_element_with_tag_name_in_scope("table"));
        assert!(!stack.has_element_with_tag_name_in_scope("div"));
        assert!(!stack.has_element_with_tag_name_in_scope("p"));
    }

    #[test]
    fn pop_until_tag() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let mut stack = StackOfOpenElements::new();
        let div = document.create_element("div");
        stack.push(div);
        stack.push(document.create_element("p"));
        stack.push(document.create_element("b"));

        stack.pop_elements_until_element_has_been_popped("p");
        assert_eq!(stack.len(), 1);
        assert!(Node::are_same(stack.current_node().unwrap(), div));
    }
}
