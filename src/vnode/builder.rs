//! Builder-style construction of virtual nodes.
//!
//! ```ignore
//! let list = h("ul")
//!     .prop("class", "todos")
//!     .children(items.iter().map(|item| h("li").key(item.id).text(&item.title).build()))
//!     .build();
//! ```

use super::node::{Children, EventHandler, Event, Key, PropValue, Props, VNode, VNodeType};

/// Start building a node of type `ty` (a tag name or a component).
pub fn h(ty: impl Into<VNodeType>) -> VNodeBuilder {
    VNodeBuilder {
        ty: ty.into(),
        props: None,
        children: Children::None,
        key: None,
    }
}

/// Builder returned by [`h`].
#[derive(Debug)]
pub struct VNodeBuilder {
    ty: VNodeType,
    props: Option<Props>,
    children: Children,
    key: Option<Key>,
}

impl VNodeBuilder {
    /// Set the reconciliation key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set a prop. A later call with the same name replaces the value.
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props
            .get_or_insert_with(Props::new)
            .insert(name.into(), value.into());
        self
    }

    /// Set several props at once.
    pub fn props(mut self, props: Props) -> Self {
        self.props.get_or_insert_with(Props::new).extend(props);
        self
    }

    /// Attach an event handler: `on("click", ..)` sets the `onClick` prop.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        let name = handler_prop_name(event);
        self.prop(name, EventHandler::new(handler))
    }

    /// Use `text` as the only child.
    pub fn text(mut self, text: impl Into<std::rc::Rc<str>>) -> Self {
        self.children = Children::Text(text.into());
        self
    }

    /// Append one child. Replaces text children.
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        match &mut self.children {
            Children::Array(nodes) => nodes.push(child.into()),
            _ => self.children = Children::Array(vec![child.into()]),
        }
        self
    }

    /// Append children. Replaces text children.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        let iter = children.into_iter().map(Into::into);
        match &mut self.children {
            Children::Array(nodes) => nodes.extend(iter),
            _ => self.children = Children::Array(iter.collect()),
        }
        self
    }

    pub fn build(self) -> VNode {
        VNode::from_parts(self.ty, self.props, self.children, self.key)
    }
}

impl From<VNodeBuilder> for VNode {
    fn from(builder: VNodeBuilder) -> Self {
        builder.build()
    }
}

/// `"click"` -> `"onClick"`.
fn handler_prop_name(event: &str) -> String {
    let mut chars = event.chars();
    match chars.next() {
        Some(first) => format!("on{}{}", first.to_uppercase(), chars.as_str()),
        None => String::from("on"),
    }
}
