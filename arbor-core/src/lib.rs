//! Arbor Core
//!
//! This crate provides the core runtime for the Arbor UI framework.
//! It implements:
//!
//! - An element model for declarative tree descriptions
//! - A fiber reconciler that diffs element trees with keyed matching
//! - A cooperative scheduler that splits rendering into interruptible units
//! - A synchronous commit phase that applies mutations through a host binding
//! - Hooks (state, effects, memoization, refs) bound to fiber slots
//!
//! # Architecture
//!
//! - `element`: elements, props, and function components
//! - `host`: the host binding trait, prop diffing, and an in-memory host
//! - `fiber`: the fiber arena shared by the current and work-in-progress trees
//! - `reconciler`: child matching and effect tagging
//! - `scheduler`: deadlines, render requests, and the async driver
//! - `commit`: applying effect tags and running effects
//! - `hooks`: the positional hooks protocol
//! - `renderer`: the context tying the above together
//!
//! # Example
//!
//! ```rust
//! use arbor_core::prelude::*;
//!
//! fn counter(_: &Props) -> RenderResult {
//!     let (count, set_count) = use_state(|| 0i64)?;
//!     Ok(create_element(
//!         "button",
//!         Props::new().on("click", move |_| set_count.update(|c| c + 1)),
//!         vec![Child::from(count)],
//!     ))
//! }
//!
//! let mut host = MemoryHost::new();
//! host.create_container("div", "app");
//! let mut renderer = Renderer::new(host);
//! renderer.init(Component::new(counter), "app").unwrap();
//! renderer.flush_sync().unwrap();
//!
//! let app = renderer.host().container_by_id("app").unwrap();
//! let button = renderer.host().find_by_tag(app, "button").unwrap();
//! renderer.host().dispatch_event(button, &Event::new("click"));
//! renderer.flush_sync().unwrap();
//! assert_eq!(renderer.host().text_content(button), "1");
//! ```

pub mod commit;
pub mod config;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod reconciler;
pub mod renderer;
pub mod scheduler;

pub use config::RendererConfig;
pub use error::{ElementError, HookError, HostError, RenderError};
pub use renderer::Renderer;

/// Everything an application needs to define and mount components.
pub mod prelude {
    pub use crate::deps;
    pub use crate::element::{
        clone_element, create_element, is_valid_element, try_create_element, Child, Component,
        Element, Event, EventHandler, PropValue, Props, RenderResult,
    };
    pub use crate::error::RenderError;
    pub use crate::hooks::{
        cleanup, use_callback, use_effect, use_memo, use_reducer, use_ref, use_state, use_store,
        Deps,
    };
    pub use crate::host::{HostBinding, MemoryHost};
    pub use crate::renderer::Renderer;
    pub use crate::scheduler::{TimeBudget, Unbounded, UnitBudget, WorkStatus};
}
