pub mod arena;
pub mod custom_element_definition;
pub mod document;
pub mod dom_exception;
pub mod mutation_algorithms;
pub mod node;
pub mod serialization;

pub use arena::{Arena, NodeLink, NodeRef};
pub use document::{Document, ShadowRootInit, ShadowRootMode};
pub use dom_exception::{DomException, ErrorName};
pub use node::{CharacterDataVariant, Node, NodeData};

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Self {
        Attribute {
            name: name.to_ascii_lowercase(),
            value: value.to_string(),
        }
    }
}

impl From<tokenizer::Attribute> for Attribute {
    fn from(value: tokenizer::Attribute) -> Self {
        Attribute {
            name: value.name,
            value: value.value,
        }
    }
}
