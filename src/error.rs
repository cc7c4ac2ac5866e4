//! Error types.

use std::rc::Rc;

/// Failure of a component render function.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),
    #[error("component `{0}` has neither a render function nor a setup returning one")]
    MissingRender(String),
}

impl RenderError {
    /// Shorthand for [`RenderError::Failed`].
    pub fn failed(message: impl Into<String>) -> Self {
        RenderError::Failed(message.into())
    }
}

/// Receives render errors together with the failing component's name.
pub type ErrorHandler = Rc<dyn Fn(&RenderError, &str)>;
