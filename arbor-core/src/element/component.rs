use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use super::{Element, Props};
use crate::error::RenderError;

/// What a component body returns.
pub type RenderResult = Result<Element, RenderError>;

/// A function component.
///
/// Two components are the same type when they wrap the same callable type, so
/// a plain `fn` item or a closure defined at one site keeps its identity across
/// renders even though a fresh `Component` is built every time.
#[derive(Clone)]
pub struct Component {
    id: TypeId,
    name: &'static str,
    render: Arc<dyn Fn(&Props) -> RenderResult + Send + Sync>,
}

impl Component {
    pub fn new<F>(render: F) -> Self
    where
        F: Fn(&Props) -> RenderResult + Send + Sync + 'static,
    {
        Self {
            id: TypeId::of::<F>(),
            name: std::any::type_name::<F>(),
            render: Arc::new(render),
        }
    }

    /// Fully qualified name of the wrapped callable, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.id
    }

    pub(crate) fn render(&self, props: &Props) -> RenderResult {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Component {}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Component").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(_: &Props) -> RenderResult {
        Ok(Element::text("first"))
    }

    fn second(_: &Props) -> RenderResult {
        Ok(Element::text("second"))
    }

    #[test]
    fn identity_follows_the_callable() {
        assert_eq!(Component::new(first), Component::new(first));
        assert_ne!(Component::new(first), Component::new(second));
        assert!(Component::new(first).name().ends_with("first"));
    }

    #[test]
    fn closures_from_one_site_share_identity() {
        let make = || Component::new(|_: &Props| Ok(Element::fragment(Vec::new())));
        assert_eq!(make(), make());
    }
}
