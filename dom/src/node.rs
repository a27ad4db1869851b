use std::cell::{Cell, Ref, RefCell};

use crate::arena::{NodeLink, NodeRef};
use crate::document::ShadowRootMode;
use crate::Attribute;

/// A node in an arena-allocated tree.
///
/// `children` is the source of truth for the child list, the sibling and
/// first/last child links are kept in sync with it by the mutation algorithms.
pub struct Node<'a> {
    pub(crate) document: NodeLink<'a>,
    pub(crate) parent: NodeLink<'a>,
    pub(crate) children: RefCell<Vec<NodeRef<'a>>>,
    pub(crate) previous_sibling: NodeLink<'a>,
    pub(crate) next_sibling: NodeLink<'a>,
    pub(crate) first_child: NodeLink<'a>,
    pub(crate) last_child: NodeLink<'a>,
    // Set on shadow hosts.
    pub(crate) shadow_root: NodeLink<'a>,
    // Set on shadow roots.
    pub(crate) host: NodeLink<'a>,
    pub data: NodeData,
}

impl<'a> Node<'a> {
    pub fn new(document: Option<NodeRef<'a>>, data: NodeData) -> Node<'a> {
        Node {
            document: Cell::new(document),
            parent: Cell::new(None),
            children: RefCell::new(Vec::new()),
            previous_sibling: Cell::new(None),
            next_sibling: Cell::new(None),
            first_child: Cell::new(None),
            last_child: Cell::new(None),
            shadow_root: Cell::new(None),
            host: Cell::new(None),
            data,
        }
    }

    pub fn are_same(a: NodeRef<'a>, b: NodeRef<'a>) -> bool {
        std::ptr::eq(a, b)
    }

    pub fn are_same_optional(a: Option<NodeRef<'a>>, b: Option<NodeRef<'a>>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Node::are_same(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    // https://dom.spec.whatwg.org/#concept-node-document
    pub fn node_document(&'a self) -> NodeRef<'a> {
        match self.document.get() {
            Some(document) => document,
            None => self,
        }
    }

    // https://dom.spec.whatwg.org/#concept-tree-root
    pub fn root(&'a self) -> NodeRef<'a> {
        let mut root = self;
        while let Some(parent) = root.parent() {
            root = parent;
        }
        root
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.parent.get()
    }

    pub fn parent_element(&self) -> Option<NodeRef<'a>> {
        self.parent().filter(|parent| parent.is_element())
    }

    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        self.previous_sibling.get()
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.next_sibling.get()
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        self.first_child.get()
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        self.last_child.get()
    }

    pub fn children(&self) -> Ref<'_, Vec<NodeRef<'a>>> {
        self.children.borrow()
    }

    /// A copy of the child list, safe to hold while the tree is mutated.
    pub fn child_nodes(&self) -> Vec<NodeRef<'a>> {
        self.children.borrow().clone()
    }

    pub fn element_children(&self) -> Vec<NodeRef<'a>> {
        self.children
            .borrow()
            .iter()
            .copied()
            .filter(|child| child.is_element())
            .collect()
    }

    pub fn has_child_nodes(&self) -> bool {
        !self.children.borrow().is_empty()
    }

    // https://dom.spec.whatwg.org/#concept-tree-index
    pub fn index(&self) -> usize {
        let mut index = 0;
        let mut current = self.previous_sibling();
        while let Some(node) = current {
            index += 1;
            current = node.previous_sibling();
        }
        index
    }

    // https://dom.spec.whatwg.org/#concept-tree-inclusive-ancestor
    pub fn is_inclusive_ancestor_of(&'a self, other: NodeRef<'a>) -> bool {
        let mut current = Some(other);
        while let Some(node) = current {
            if Node::are_same(node, self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    // https://dom.spec.whatwg.org/#concept-shadow-including-inclusive-ancestor
    pub fn is_host_including_inclusive_ancestor_of(&'a self, other: NodeRef<'a>) -> bool {
        if self.is_inclusive_ancestor_of(other) {
            return true;
        }
        match other.root().host() {
            Some(host) => self.is_host_including_inclusive_ancestor_of(host),
            None => false,
        }
    }

    /// Descendants in tree order, not including `self`.
    pub fn descendants(&self) -> Vec<NodeRef<'a>> {
        let mut nodes = Vec::new();
        let mut stack: Vec<NodeRef<'a>> = self.children.borrow().iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.borrow().iter().rev().copied());
        }
        nodes
    }

    pub fn get_elements_by_tag_name(&self, local_name: &str) -> Vec<NodeRef<'a>> {
        self.descendants()
            .into_iter()
            .filter(|node| node.is_element_with_tag(local_name))
            .collect()
    }

    pub fn is_document(&self) -> bool {
        matches!(self.data, NodeData::Document)
    }

    /// True for document fragments, shadow roots included.
    pub fn is_document_fragment(&self) -> bool {
        matches!(
            self.data,
            NodeData::DocumentFragment | NodeData::ShadowRoot { .. }
        )
    }

    pub fn is_shadow_root(&self) -> bool {
        matches!(self.data, NodeData::ShadowRoot { .. })
    }

    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element { .. })
    }

    pub fn is_character_data(&self) -> bool {
        matches!(self.data, NodeData::CharacterData { .. })
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::Text,
                ..
            }
        )
    }

    pub fn is_comment(&self) -> bool {
        matches!(
            self.data,
            NodeData::CharacterData {
                variant: CharacterDataVariant::Comment,
                ..
            }
        )
    }

    pub fn element_tag_name(&self) -> Option<&str> {
        if let NodeData::Element { local_name, .. } = &self.data {
            return Some(local_name);
        }
        None
    }

    pub fn is_element_with_tag(&self, tag: &str) -> bool {
        self.element_tag_name() == Some(tag)
    }

    pub fn is_element_with_one_of_tags(&self, tags: &[&str]) -> bool {
        match self.element_tag_name() {
            Some(name) => tags.contains(&name),
            None => false,
        }
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        match &self.data {
            NodeData::Element { attributes, .. } => attributes.borrow().clone(),
            _ => Vec::new(),
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element { attributes, .. } = &self.data else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        attributes
            .borrow()
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.clone())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Sets `name` to `value` and returns the previous value.
    pub fn set_attribute(&self, name: &str, value: &str) -> Option<String> {
        let NodeData::Element { attributes, .. } = &self.data else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        let mut attributes = attributes.borrow_mut();
        match attributes.iter_mut().find(|attribute| attribute.name == name) {
            Some(attribute) => Some(std::mem::replace(&mut attribute.value, value.to_string())),
            None => {
                attributes.push(Attribute {
                    name,
                    value: value.to_string(),
                });
                None
            }
        }
    }

    /// Removes `name` and returns the value it had.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element { attributes, .. } = &self.data else {
            return None;
        };
        let name = name.to_ascii_lowercase();
        let mut attributes = attributes.borrow_mut();
        let index = attributes
            .iter()
            .position(|attribute| attribute.name == name)?;
        Some(attributes.remove(index).value)
    }

    // https://dom.spec.whatwg.org/#dom-element-toggleattribute
    pub fn toggle_attribute(&self, name: &str, force: bool) -> bool {
        match (self.has_attribute(name), force) {
            (false, true) => {
                self.set_attribute(name, "");
            }
            (true, false) => {
                self.remove_attribute(name);
            }
            _ => {}
        }
        force
    }

    pub fn character_data(&self) -> Option<String> {
        match &self.data {
            NodeData::CharacterData { data, .. } => Some(data.borrow().clone()),
            _ => None,
        }
    }

    // https://dom.spec.whatwg.org/#dom-node-textcontent
    pub fn text_content(&self) -> String {
        match &self.data {
            NodeData::CharacterData { data, .. } => data.borrow().clone(),
            _ => self
                .descendants()
                .into_iter()
                .filter(|node| node.is_text())
                .filter_map(|node| node.character_data())
                .collect(),
        }
    }

    pub fn append_data(&self, more: &str) {
        if let NodeData::CharacterData { data, .. } = &self.data {
            data.borrow_mut().push_str(more);
        }
    }

    /// The shadow root attached to this element, if it is open.
    pub fn shadow_root(&self) -> Option<NodeRef<'a>> {
        self.shadow_root
            .get()
            .filter(|root| root.shadow_root_mode() == Some(ShadowRootMode::Open))
    }

    pub fn is_shadow_host(&self) -> bool {
        self.shadow_root.get().is_some()
    }

    pub fn host(&self) -> Option<NodeRef<'a>> {
        self.host.get()
    }

    pub fn shadow_root_mode(&self) -> Option<ShadowRootMode> {
        match self.data {
            NodeData::ShadowRoot { mode, .. } => Some(mode),
            _ => None,
        }
    }

    pub fn delegates_focus(&self) -> bool {
        matches!(
            self.data,
            NodeData::ShadowRoot {
                delegates_focus: true,
                ..
            }
        )
    }

    // https://dom.spec.whatwg.org/#concept-slotable
    fn is_slottable(&self) -> bool {
        self.is_element() || self.is_text()
    }

    /// The nodes a `<slot>` in a shadow root projects from its host.
    // https://dom.spec.whatwg.org/#find-slotables
    pub fn assigned_nodes(&'a self) -> Vec<NodeRef<'a>> {
        if !self.is_element_with_tag("slot") {
            return Vec::new();
        }
        let Some(host) = self.root().host() else {
            return Vec::new();
        };
        let name = self.get_attribute("name").unwrap_or_default();
        host.children()
            .iter()
            .copied()
            .filter(|child| child.is_slottable())
            .filter(|child| child.get_attribute("slot").unwrap_or_default() == name)
            .collect()
    }
}

impl<'a> std::fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_document() {
            return write!(f, "Document {{ ... }}");
        }

        f.debug_struct("Node")
            .field("data", &self.data)
            .field("children", &self.children.borrow())
            .field("parent", &self.parent.get().map(|v| v.data.to_string()))
            .finish()
    }
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub enum NodeData {
    Document,
    DocumentFragment,
    ShadowRoot {
        mode: ShadowRootMode,
        delegates_focus: bool,
    },
    Element {
        local_name: String,
        attributes: RefCell<Vec<Attribute>>,
    },
    CharacterData {
        data: RefCell<String>,
        variant: CharacterDataVariant,
    },
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum CharacterDataVariant {
    Text,
    Comment,
}

impl std::fmt::Display for NodeData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeData::Document => write!(f, "Document"),
            NodeData::DocumentFragment => write!(f, "DocumentFragment"),
            NodeData::ShadowRoot { .. } => write!(f, "ShadowRoot"),
            NodeData::Element { local_name, .. } => write!(f, "Element({local_name})"),
            NodeData::CharacterData { variant, .. } => match variant {
                CharacterDataVariant::Text => write!(f, "Text"),
                CharacterDataVariant::Comment => write!(f, "Comment"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, ShadowRootInit};
    use crate::node::Node;
    use crate::Attribute;

    #[test]
    fn are_same_optional() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let a = document.create_element("div");
        let b = document.create_element("div");

        assert!(!Node::are_same_optional(Some(a), Some(b)));
        assert!(!Node::are_same_optional(Some(a), None));
        assert!(!Node::are_same_optional(None, Some(b)));
        assert!(Node::are_same_optional(Some(a), Some(a)));
        assert!(Node::are_same_optional(None, None));
    }

    #[test]
    fn attributes() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let element =
            document.create_element_with_attributes("a", vec![Attribute::new("HREF", "/x")]);

        assert_eq!(element.get_attribute("href").as_deref(), Some("/x"));
        assert_eq!(element.set_attribute("href", "/y").as_deref(), Some("/x"));
        assert_eq!(element.set_attribute("title", "t"), None);
        assert!(element.has_attribute("TITLE"));
        assert_eq!(element.remove_attribute("title").as_deref(), Some("t"));
        assert_eq!(element.remove_attribute("title"), None);

        element.toggle_attribute("hidden", true);
        assert_eq!(element.get_attribute("hidden").as_deref(), Some(""));
        element.toggle_attribute("hidden", false);
        assert!(!element.has_attribute("hidden"));
    }

    #[test]
    fn text_content_and_tag_lookup() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let div = document.create_element("div");
        let script = document.create_element("script");
        div.append_child(document.create_text_node("a")).unwrap();
        div.append_child(script).unwrap();
        script.append_child(document.create_text_node("b()")).unwrap();
        div.append_child(document.create_comment("not text")).unwrap();

        assert_eq!(div.text_content(), "ab()");
        assert_eq!(div.get_elements_by_tag_name("script").len(), 1);
        assert_eq!(script.root().element_tag_name(), Some("div"));
    }

    #[test]
    fn slot_assigned_nodes() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let host = document.create_element("x-host");
        let plain = document.create_text_node("plain");
        let named = document.create_element_with_attributes("span", vec![Attribute::new("slot", "title")]);
        host.append_child(plain).unwrap();
        host.append_child(named).unwrap();

        let root = document
            .attach_shadow(host, ShadowRootInit::default())
            .unwrap();
        let default_slot = document.create_element("slot");
        let title_slot =
            document.create_element_with_attributes("slot", vec![Attribute::new("name", "title")]);
        root.append_child(default_slot).unwrap();
        root.append_child(title_slot).unwrap();

        assert_eq!(default_slot.assigned_nodes().len(), 1);
        assert!(Node::are_same(default_slot.assigned_nodes()[0], plain));
        assert!(Node::are_same(title_slot.assigned_nodes()[0], named));
    }
}
