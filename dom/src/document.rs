use std::cell::RefCell;

use crate::arena::{Arena, NodeRef};
use crate::custom_element_definition::is_valid_custom_element_name;
use crate::dom_exception::{DomException, ErrorName};
use crate::node::{CharacterDataVariant, Node, NodeData};
use crate::Attribute;

/// Handle to a document node and the arena its nodes are allocated in.
#[derive(Clone, Copy)]
pub struct Document<'a> {
    arena: Arena<'a>,
    node: NodeRef<'a>,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Default)]
pub enum ShadowRootMode {
    #[default]
    Open,
    Closed,
}

// https://dom.spec.whatwg.org/#dictdef-shadowrootinit
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default)]
pub struct ShadowRootInit {
    pub mode: ShadowRootMode,
    pub delegates_focus: bool,
}

// https://dom.spec.whatwg.org/#dom-element-attachshadow
static VALID_SHADOW_HOST_NAMES: &[&str] = &[
    "article",
    "aside",
    "blockquote",
    "body",
    "div",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "main",
    "nav",
    "p",
    "section",
    "span",
];

impl<'a> Document<'a> {
    pub fn new(arena: Arena<'a>) -> Self {
        let node = arena.alloc(Node::new(None, NodeData::Document));
        Self { arena, node }
    }

    pub fn node(&self) -> NodeRef<'a> {
        self.node
    }

    fn allocate_node(&self, data: NodeData) -> NodeRef<'a> {
        self.arena.alloc(Node::new(Some(self.node), data))
    }

    pub fn create_element(&self, local_name: &str) -> NodeRef<'a> {
        self.create_element_with_attributes(local_name, Vec::new())
    }

    pub fn create_element_with_attributes(
        &self,
        local_name: &str,
        attributes: Vec<Attribute>,
    ) -> NodeRef<'a> {
        self.allocate_node(NodeData::Element {
            local_name: local_name.to_ascii_lowercase(),
            attributes: RefCell::new(attributes),
        })
    }

    pub fn create_text_node(&self, data: &str) -> NodeRef<'a> {
        self.allocate_node(NodeData::CharacterData {
            data: RefCell::new(data.to_string()),
            variant: CharacterDataVariant::Text,
        })
    }

    pub fn create_comment(&self, data: &str) -> NodeRef<'a> {
        self.allocate_node(NodeData::CharacterData {
            data: RefCell::new(data.to_string()),
            variant: CharacterDataVariant::Comment,
        })
    }

    pub fn create_document_fragment(&self) -> NodeRef<'a> {
        self.allocate_node(NodeData::DocumentFragment)
    }

    // https://dom.spec.whatwg.org/#concept-attach-a-shadow-root
    pub fn attach_shadow(
        &self,
        host: NodeRef<'a>,
        init: ShadowRootInit,
    ) -> Result<NodeRef<'a>, DomException> {
        // 1. If element's namespace is not the HTML namespace, then throw a "NotSupportedError" DOMException.
        let Some(local_name) = host.element_tag_name() else {
            return Err(ErrorName::NotSupportedError.into());
        };

        // 2. If element's local name is not a valid shadow host name, then throw a "NotSupportedError" DOMException.
        if !VALID_SHADOW_HOST_NAMES.contains(&local_name)
            && !is_valid_custom_element_name(local_name)
        {
            return Err(ErrorName::NotSupportedError.into());
        }

        // 4. If element is a shadow host, then throw a "NotSupportedError" DOMException.
        if host.is_shadow_host() {
            return Err(ErrorName::NotSupportedError.into());
        }

        // 5. Let shadow be a new shadow root whose node document is element's node document,
        //    host is element, and mode is mode.
        // 6. Set shadow's delegates focus to delegatesFocus.
        let shadow = self.arena.alloc(Node::new(
            Some(host.node_document()),
            NodeData::ShadowRoot {
                mode: init.mode,
                delegates_focus: init.delegates_focus,
            },
        ));
        shadow.host.set(Some(host));

        // 10. Set element's shadow root to shadow.
        host.shadow_root.set(Some(shadow));
        Ok(shadow)
    }
}

impl<'a> std::fmt::Debug for Document<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Document {{ children: {} }}", self.node.children().len())
    }
}
