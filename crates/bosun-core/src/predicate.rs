//! Resource predicates
//!
//! Predicates select resources by kind, labels or annotations. They are
//! cheap to clone and compose with [`Predicate::and`], [`Predicate::or`] and
//! `!`. They gate hooks and pick the objects uninstalled first.

use std::fmt;
use std::ops::Not;
use std::sync::Arc;

use crate::resource::Resource;

/// Kind of a CustomResourceDefinition
pub const CRD_KIND: &str = "CustomResourceDefinition";

/// Kind of an apps/v1 Deployment
pub const DEPLOYMENT_KIND: &str = "Deployment";

/// A filter over resources
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&Resource) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Resource) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Matches every resource
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Matches no resource
    pub fn never() -> Self {
        Self::new(|_| false)
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        (self.0)(resource)
    }

    /// True only when both predicates match
    pub fn and(self, other: Predicate) -> Self {
        Self::new(move |r| self.matches(r) && other.matches(r))
    }

    /// True when either predicate matches
    pub fn or(self, other: Predicate) -> Self {
        Self::new(move |r| self.matches(r) || other.matches(r))
    }

    /// True only if every predicate matches; an empty list matches everything
    pub fn all_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().collect();
        Self::new(move |r| predicates.iter().all(|p| p.matches(r)))
    }

    /// True if any predicate matches; an empty list matches nothing
    pub fn any_of(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        let predicates: Vec<_> = predicates.into_iter().collect();
        Self::new(move |r| predicates.iter().any(|p| p.matches(r)))
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::always()
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        Self::new(move |r| !self.matches(r))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl<F> From<F> for Predicate
where
    F: Fn(&Resource) -> bool + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self::new(f)
    }
}

pub fn has_kind(kind: impl Into<String>) -> Predicate {
    let kind = kind.into();
    Predicate::new(move |r| r.kind() == kind)
}

pub fn has_label(key: impl Into<String>, value: impl Into<String>) -> Predicate {
    let (key, value) = (key.into(), value.into());
    Predicate::new(move |r| r.label(&key) == Some(value.as_str()))
}

pub fn has_annotation(key: impl Into<String>, value: impl Into<String>) -> Predicate {
    let (key, value) = (key.into(), value.into());
    Predicate::new(move |r| r.annotation(&key) == Some(value.as_str()))
}

pub fn is_crd() -> Predicate {
    has_kind(CRD_KIND)
}

pub fn is_deployment() -> Predicate {
    has_kind(DEPLOYMENT_KIND)
}

/// Split resources into those matching the predicate and the rest
///
/// Without a predicate nothing matches: every resource lands in the second
/// list. Order is preserved within both lists.
pub fn split_by_predicate(
    resources: Vec<Resource>,
    predicate: Option<&Predicate>,
) -> (Vec<Resource>, Vec<Resource>) {
    match predicate {
        Some(predicate) => resources.into_iter().partition(|r| predicate.matches(r)),
        None => (Vec::new(), resources),
    }
}
