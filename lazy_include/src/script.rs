//! Script execution port.

use dom::NodeRef;

use crate::error::ScriptError;

/// The receiver a script runs against.
#[derive(Debug, Clone, Copy)]
pub enum ExecutionContext<'a> {
    /// The global object.
    Global,
    /// The include element itself.
    Element(NodeRef<'a>),
}

impl<'a> ExecutionContext<'a> {
    pub fn is_global(&self) -> bool {
        matches!(self, ExecutionContext::Global)
    }

    pub fn element(&self) -> Option<NodeRef<'a>> {
        match self {
            ExecutionContext::Global => None,
            ExecutionContext::Element(element) => Some(*element),
        }
    }
}

/// Runs script source text on behalf of an include element.
pub trait ScriptExecutor<'a> {
    fn execute(&self, source: &str, context: ExecutionContext<'a>) -> Result<(), ScriptError>;
}

/// An executor that refuses to run anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyScripts;

impl<'a> ScriptExecutor<'a> for DenyScripts {
    fn execute(&self, source: &str, _context: ExecutionContext<'a>) -> Result<(), ScriptError> {
        tracing::debug!(len = source.len(), "refusing to execute script");
        Err(ScriptError::Refused)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom::{Document, Node};

    #[test]
    fn context_accessors() {
        let arena = typed_arena::Arena::new();
        let document = Document::new(&arena);
        let host = document.create_element("lazy-html-include");

        assert!(ExecutionContext::Global.is_global());
        assert!(ExecutionContext::Global.element().is_none());

        let scoped = ExecutionContext::Element(host);
        assert!(!scoped.is_global());
        assert!(Node::are_same(scoped.element().unwrap(), host));
    }

    #[test]
    fn deny_scripts_refuses() {
        let result = DenyScripts.execute("alert(1)", ExecutionContext::Global);
        assert_eq!(result, Err(ScriptError::Refused));
    }
}
