//! Error types
//!
//! Each layer of the runtime has its own error enum. They are aggregated into
//! [`RenderError`], which is what the scheduler hands back to the embedder when
//! a driver invocation fails.

use thiserror::Error;

/// Raised while constructing elements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    /// A host tag was empty.
    #[error("element type is missing: host tag is empty")]
    EmptyTag,

    /// A host tag contained characters that cannot name an output node.
    #[error("invalid element type `{tag}`: {reason}")]
    InvalidTag { tag: String, reason: &'static str },
}

/// Raised by a host binding while creating or mutating output nodes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("host node {0} does not exist")]
    UnknownNode(String),

    #[error("invalid attribute `{name}`: {reason}")]
    InvalidAttribute { name: String, reason: &'static str },

    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    #[error("text nodes cannot hold children")]
    TextParent,

    #[error("failed to serialize host snapshot: {0}")]
    Snapshot(String),
}

/// Raised when the positional hook protocol is violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// A hook ran while no component was rendering.
    #[error("`{hook}` called outside of a component render")]
    OutsideRender { hook: &'static str },

    /// Slot `index` held a different kind of hook on the previous render.
    #[error("hook slot {index} was `{previous}` on the previous render but `{current}` now; hooks must be called unconditionally and in the same order")]
    SlotMismatch {
        index: usize,
        previous: &'static str,
        current: &'static str,
    },

    /// Slot `index` holds a value of a different type than requested.
    #[error("hook slot {index} does not hold a `{expected}`")]
    TypeMismatch { index: usize, expected: &'static str },

    /// The component called a different number of hooks than last time.
    #[error("component `{component}` called {current} hooks but {previous} on the previous render")]
    CountMismatch {
        component: &'static str,
        previous: usize,
        current: usize,
    },
}

/// Error returned from a render pass or commit.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Element(#[from] ElementError),

    #[error(transparent)]
    Hook(#[from] HookError),

    #[error("host binding failed: {0}")]
    Host(#[from] HostError),

    /// A component body reported a failure.
    #[error("component `{component}` failed: {message}")]
    Component {
        component: &'static str,
        message: String,
    },

    #[error("no container with id `{0}`")]
    ContainerNotFound(String),
}

impl RenderError {
    /// Build a component failure from inside a component body.
    ///
    /// The component name is filled in by the scheduler when the error
    /// surfaces, so `component` starts out empty.
    pub fn component(message: impl Into<String>) -> Self {
        Self::Component {
            component: "",
            message: message.into(),
        }
    }

    pub(crate) fn with_component(self, name: &'static str) -> Self {
        match self {
            Self::Component { component, message } if component.is_empty() => Self::Component {
                component: name,
                message,
            },
            other => other,
        }
    }
}
