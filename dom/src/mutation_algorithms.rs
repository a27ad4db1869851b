use crate::arena::NodeRef;
use crate::dom_exception::{DomException, ErrorName};
use crate::node::Node;

// 4.2.3. Mutation algorithms
// https://dom.spec.whatwg.org/#mutation-algorithms
impl<'a> Node<'a> {
    // https://dom.spec.whatwg.org/#concept-node-ensure-pre-insertion-validity
    pub fn ensure_pre_insertion_validity(
        node: NodeRef<'a>,
        parent: NodeRef<'a>,
        child: Option<NodeRef<'a>>,
    ) -> Result<(), DomException> {
        // 1. If parent is not a Document, DocumentFragment, or Element node, then throw a "HierarchyRequestError" DOMException.
        if !parent.is_document() && !parent.is_document_fragment() && !parent.is_element() {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // 2. If node is a host-including inclusive ancestor of parent, then throw a "HierarchyRequestError" DOMException.
        if node.is_host_including_inclusive_ancestor_of(parent) {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // 3. If child is non-null and its parent is not parent, then throw a "NotFoundError" DOMException.
        if let Some(child) = child {
            if !Node::are_same_optional(child.parent(), Some(parent)) {
                return Err(ErrorName::NotFoundError.into());
            }
        }

        // 4. If node is not a DocumentFragment, Element, or CharacterData node, then throw a "HierarchyRequestError" DOMException.
        //    Shadow roots are never inserted.
        if node.is_shadow_root() || node.is_document() {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // 5. If node is a Text node and parent is a document, then throw a "HierarchyRequestError" DOMException.
        if node.is_text() && parent.is_document() {
            return Err(ErrorName::HierarchyRequestError.into());
        }

        // 6. If parent is a document and it would end up with more than one element child,
        //    then throw a "HierarchyRequestError" DOMException.
        if parent.is_document() {
            let inserted_elements = match node.is_document_fragment() {
                true => node.element_children().len(),
                false => usize::from(node.is_element()),
            };
            let has_element_child = parent.children().iter().any(|child| child.is_element());
            if inserted_elements > 1 || (inserted_elements == 1 && has_element_child) {
                return Err(ErrorName::HierarchyRequestError.into());
            }
        }

        Ok(())
    }

    // https://dom.spec.whatwg.org/#concept-node-pre-insert
    pub fn pre_insert(
        node: NodeRef<'a>,
        parent: NodeRef<'a>,
        child: Option<NodeRef<'a>>,
    ) -> Result<NodeRef<'a>, DomException> {
        // 1. Ensure pre-insertion validity of node into parent before child.
        Node::ensure_pre_insertion_validity(node, parent, child)?;

        // 2. Let referenceChild be child.
        let mut reference_child = child;

        // 3. If referenceChild is node, then set referenceChild to node's next sibling.
        if Node::are_same_optional(reference_child, Some(node)) {
            reference_child = node.next_sibling();
        }

        // 4. Insert node into parent before referenceChild.
        Node::insert(node, parent, reference_child);

        // 5. Return node.
        Ok(node)
    }

    // https://dom.spec.whatwg.org/#concept-node-insert
    pub fn insert(node: NodeRef<'a>, parent: NodeRef<'a>, child: Option<NodeRef<'a>>) {
        // 1. Let nodes be node's children, if node is a DocumentFragment node; otherwise « node ».
        let nodes = match node.is_document_fragment() {
            true => node.child_nodes(),
            false => vec![node],
        };

        // 2. Let count be nodes's size.
        // 3. If count is 0, then return.
        if nodes.is_empty() {
            return;
        }

        // 4. If node is a DocumentFragment node, then remove its children.
        //    Otherwise, if node has a parent, remove it from there first.
        for node in nodes.iter().copied() {
            if node.parent().is_some() {
                Node::remove(node);
            }
        }

        // 6. For each node in nodes, in tree order:
        for node in nodes.iter().copied() {
            // 6.1. Adopt node into parent's node document.
            Node::adopt(node, parent.node_document());

            // 6.2. If child is null, then append node to parent's children.
            // 6.3. Otherwise, insert node into parent's children before child's index.
            {
                let mut children = parent.children.borrow_mut();
                match child {
                    Some(child) => {
                        let index = children
                            .iter()
                            .position(|c| Node::are_same(*c, child))
                            .unwrap_or(children.len());
                        children.insert(index, node);
                    }
                    None => children.push(node),
                }
            }
            node.parent.set(Some(parent));
        }

        parent.relink_children();

        // FIXME: 7. Queue a tree mutation record for parent with nodes, « », previousSibling, and child.
    }

    // https://dom.spec.whatwg.org/#concept-node-append
    pub fn append(node: NodeRef<'a>, parent: NodeRef<'a>) -> Result<NodeRef<'a>, DomException> {
        Node::pre_insert(node, parent, None)
    }

    // https://dom.spec.whatwg.org/#concept-node-remove
    pub fn remove(node: NodeRef<'a>) {
        // 1. Let parent be node's parent.
        // 2. Assert: parent is non-null.
        let Some(parent) = node.parent() else {
            return;
        };

        // 9. Remove node from its parent's children.
        parent
            .children
            .borrow_mut()
            .retain(|child| !Node::are_same(*child, node));
        node.parent.set(None);
        node.previous_sibling.set(None);
        node.next_sibling.set(None);
        parent.relink_children();
    }

    // https://dom.spec.whatwg.org/#concept-node-replace-all
    pub fn replace_all(node: Option<NodeRef<'a>>, parent: NodeRef<'a>) {
        // 1. Let removedNodes be parent's children.
        // 4. Remove all parent's children, in tree order.
        for child in parent.child_nodes() {
            Node::remove(child);
        }

        // 5. If node is non-null, then insert node into parent before null.
        if let Some(node) = node {
            Node::insert(node, parent, None);
        }
    }

    // https://dom.spec.whatwg.org/#concept-node-adopt
    pub fn adopt(node: NodeRef<'a>, document: NodeRef<'a>) {
        // 3.1. For each inclusiveDescendant in node's shadow-including inclusive descendants:
        //      set inclusiveDescendant's node document to document.
        node.document.set(Some(document));
        for descendant in node.descendants() {
            descendant.document.set(Some(document));
        }
        if let Some(shadow_root) = node.shadow_root.get() {
            Node::adopt(shadow_root, document);
        }
    }

    fn relink_children(&self) {
        let children = self.children.borrow();
        self.first_child.set(children.first().copied());
        self.last_child.set(children.last().copied());
        for (index, child) in children.iter().enumerate() {
            child
                .previous_sibling
                .set(index.checked_sub(1).map(|previous| children[previous]));
            child.next_sibling.set(children.get(index + 1).copied());
        }
    }
}

// IDL
// https://dom.spec.whatwg.org/#interface-node
impl<'a> Node<'a> {
    // https://dom.spec.whatwg.org/#dom-node-appendchild
    pub fn append_child(&'a self, node: NodeRef<'a>) -> Result<NodeRef<'a>, DomException> {
        Node::append(node, self)
    }

    // https://dom.spec.whatwg.org/#dom-node-insertbefore
    pub fn insert_before(
        &'a self,
        node: NodeRef<'a>,
        child: Option<NodeRef<'a>>,
    ) -> Result<NodeRef<'a>, DomException> {
        Node::pre_insert(node, self, child)
    }

    // https://dom.spec.whatwg.org/#dom-node-removechild
    pub fn remove_child(&'a self, child: NodeRef<'a>) -> Result<NodeRef<'a>, DomException> {
        if !Node::are_same_optional(child.parent(), Some(self)) {
            return Err(ErrorName::NotFoundError.into());
        }
        Node::remove(child);
        Ok(child)
    }

    // https://dom.spec.whatwg.org/#dom-parentnode-replacechildren
    pub fn replace_children(&'a self, node: Option<NodeRef<'a>>) -> Result<(), DomException> {
        if let Some(node) = node {
            Node::ensure_pre_insertion_validity(node, self, None)?;
        }
        Node::replace_all(node, self);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{Document, ShadowRootInit};
    use crate::dom_exception::ErrorName;
    use crate::node::Node;

    #[test]
    fn sibling_links_follow_the_child_list() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let parent = document.create_element("div");
        let a = document.create_element("a");
        let b = document.create_element("b");
        let c = document.create_element("c");

        parent.append_child(a).unwrap();
        parent.append_child(c).unwrap();
        parent.insert_before(b, Some(c)).unwrap();

        assert!(Node::are_same(parent.first_child().unwrap(), a));
        assert!(Node::are_same(parent.last_child().unwrap(), c));
        assert!(Node::are_same(a.next_sibling().unwrap(), b));
        assert!(Node::are_same(c.previous_sibling().unwrap(), b));
        assert_eq!(b.index(), 1);

        parent.remove_child(b).unwrap();
        assert!(Node::are_same(a.next_sibling().unwrap(), c));
        assert!(b.parent().is_none());
        assert!(b.next_sibling().is_none());
        assert_eq!(c.index(), 1);
    }

    #[test]
    fn inserting_a_fragment_moves_its_children() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let parent = document.create_element("div");
        let fragment = document.create_document_fragment();
        fragment.append_child(document.create_text_node("x")).unwrap();
        fragment.append_child(document.create_element("p")).unwrap();

        parent.append_child(fragment).unwrap();

        assert_eq!(parent.children().len(), 2);
        assert!(!fragment.has_child_nodes());
        assert!(parent.children()[1].is_element_with_tag("p"));
    }

    #[test]
    fn moving_a_node_detaches_it_from_the_old_parent() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let first = document.create_element("div");
        let second = document.create_element("div");
        let child = document.create_element("span");

        first.append_child(child).unwrap();
        second.append_child(child).unwrap();

        assert!(!first.has_child_nodes());
        assert!(Node::are_same(child.parent().unwrap(), second));
    }

    #[test]
    fn replace_children() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let parent = document.create_element("div");
        parent.append_child(document.create_text_node("old")).unwrap();

        parent
            .replace_children(Some(document.create_text_node("new")))
            .unwrap();
        assert_eq!(parent.text_content(), "new");

        parent.replace_children(None).unwrap();
        assert!(!parent.has_child_nodes());
        assert!(parent.first_child().is_none());
    }

    #[test]
    fn hierarchy_errors() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let parent = document.create_element("div");
        let child = document.create_element("span");
        parent.append_child(child).unwrap();

        let cycle = child.append_child(parent);
        assert_eq!(cycle.unwrap_err().name, ErrorName::HierarchyRequestError);

        let text = document.create_text_node("x");
        let into_text = text.append_child(document.create_element("b"));
        assert_eq!(into_text.unwrap_err().name, ErrorName::HierarchyRequestError);

        let stranger = document.create_element("i");
        let misplaced = parent.insert_before(document.create_element("b"), Some(stranger));
        assert_eq!(misplaced.unwrap_err().name, ErrorName::NotFoundError);

        let host = document.create_element("x-host");
        let root = document
            .attach_shadow(host, ShadowRootInit::default())
            .unwrap();
        let shadow_insert = parent.append_child(root);
        assert_eq!(shadow_insert.unwrap_err().name, ErrorName::HierarchyRequestError);

        let host_cycle = root.append_child(host);
        assert_eq!(host_cycle.unwrap_err().name, ErrorName::HierarchyRequestError);
    }
}
