//! Dependency lists for effects and memos.

use std::sync::Arc;

use smallvec::SmallVec;

/// One entry of a dependency list.
///
/// Comparison is by identity, not deep equality: floats compare by bit
/// pattern (so `NaN` equals itself and `0.0` differs from `-0.0`) and shared
/// values compare by address.
#[derive(Debug, Clone)]
pub enum DepValue {
    Unit,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(Arc<str>),
    Ptr(usize),
}

impl DepValue {
    /// Depend on the identity of a shared value.
    pub fn ptr<T: ?Sized>(value: &Arc<T>) -> Self {
        Self::Ptr(Arc::as_ptr(value) as *const () as usize)
    }

    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unit, Self::Unit) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Uint(a), Self::Uint(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Ptr(a), Self::Ptr(b)) => a == b,
            _ => false,
        }
    }
}

impl From<()> for DepValue {
    fn from(_: ()) -> Self {
        Self::Unit
    }
}

impl From<bool> for DepValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DepValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for DepValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for DepValue {
    fn from(v: u32) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u64> for DepValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<usize> for DepValue {
    fn from(v: usize) -> Self {
        Self::Uint(v as u64)
    }
}

impl From<f64> for DepValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for DepValue {
    fn from(v: &str) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<String> for DepValue {
    fn from(v: String) -> Self {
        Self::Str(Arc::from(v))
    }
}

impl From<&String> for DepValue {
    fn from(v: &String) -> Self {
        Self::Str(Arc::from(v.as_str()))
    }
}

/// A dependency list. Build one with [`deps!`](crate::deps).
#[derive(Debug, Clone, Default)]
pub struct Deps(SmallVec<[DepValue; 4]>);

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: impl Into<DepValue>) {
        self.0.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepValue> {
        self.0.iter()
    }
}

impl FromIterator<DepValue> for Deps {
    fn from_iter<I: IntoIterator<Item = DepValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Whether a hook guarded by `prev` must rerun for `next`.
///
/// A missing list on either side always counts as changed.
pub fn deps_changed(prev: Option<&Deps>, next: Option<&Deps>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => {
            prev.len() != next.len() || prev.iter().zip(next.iter()).any(|(a, b)| !a.is_same(b))
        }
        _ => true,
    }
}

/// Build a [`Deps`] list from expressions convertible into [`DepValue`].
///
/// ```
/// use arbor_core::deps;
/// let id = 7;
/// let d = deps![id, "label", true];
/// assert_eq!(d.len(), 3);
/// ```
#[macro_export]
macro_rules! deps {
    () => {
        $crate::hooks::Deps::new()
    };
    ($($value:expr),+ $(,)?) => {
        <$crate::hooks::Deps as ::core::iter::FromIterator<$crate::hooks::DepValue>>::from_iter([
            $($crate::hooks::DepValue::from($value)),+
        ])
    };
}
