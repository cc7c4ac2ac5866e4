//! Node types: NodeId, NodeKind, NodeData.

pub use crate::renderer::NodeId;
use crate::vnode::{PropValue, Props};

/// What kind of host node this is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(String),
    Text,
    Comment,
}

/// Data associated with a single host node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub kind: NodeKind,
    /// Content of a text/comment node, or the text content of an element
    /// whose children were replaced by `set_element_text`.
    pub text: String,
    /// Element props as last patched. Always empty for text and comments.
    pub props: Props,
}

impl NodeData {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Element(tag.into()),
            text: String::new(),
            props: Props::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            text: text.into(),
            props: Props::new(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Comment,
            text: text.into(),
            props: Props::new(),
        }
    }

    /// Element tag, if this is an element.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Look up a prop.
    pub fn prop(&self, key: &str) -> Option<&PropValue> {
        self.props.get(key)
    }

    /// The `id` prop, as a string.
    pub fn id(&self) -> Option<&str> {
        self.prop("id").and_then(PropValue::as_str)
    }

    /// Whether the whitespace-separated `class` prop contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.prop("class")
            .and_then(PropValue::as_str)
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_defaults() {
        let data = NodeData::element("div");
        assert_eq!(data.tag(), Some("div"));
        assert!(data.is_element());
        assert!(data.text.is_empty());
        assert!(data.props.is_empty());
    }

    #[test]
    fn text_and_comment_have_no_tag() {
        assert_eq!(NodeData::text("hi").tag(), None);
        assert_eq!(NodeData::comment("c").kind, NodeKind::Comment);
    }

    #[test]
    fn id_and_class_come_from_props() {
        let mut data = NodeData::element("li");
        data.props.insert("id".into(), PropValue::from("first"));
        data.props.insert("class".into(), PropValue::from("item active"));
        assert_eq!(data.id(), Some("first"));
        assert!(data.has_class("active"));
        assert!(!data.has_class("act"));
    }

    #[test]
    fn node_id_is_copy() {
        fn assert_copy<T: Copy>() {}
        assert_copy::<NodeId>();
    }
}
