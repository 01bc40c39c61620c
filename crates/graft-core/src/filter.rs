// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property filter hook consulted by the copier.
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ident::TypeName;
use crate::metadata::PropertyDescriptor;
use crate::model::EntityView;
use crate::value::Value;

/// Decision for one property of one entity being copied.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// Copy the source value (following references as configured).
    Copy,
    /// Leave the destination property unset; nothing it references is
    /// visited through this property.
    Suppress,
    /// Store this value instead. References inside it must already be
    /// destination handles; it is never traversed.
    Substitute(Value),
}

/// Decides, per property, whether the copier copies, drops or replaces it.
///
/// `parent` is always the *source* entity that owns the property. The filter
/// is invoked once per property per copied entity.
pub trait PropertyFilter {
    /// Decides the outcome for `property` of `parent`.
    fn filter(&self, property: &PropertyDescriptor, parent: EntityView<'_>) -> FilterOutcome;
}

impl<F> PropertyFilter for F
where
    F: Fn(&PropertyDescriptor, EntityView<'_>) -> FilterOutcome,
{
    fn filter(&self, property: &PropertyDescriptor, parent: EntityView<'_>) -> FilterOutcome {
        self(property, parent)
    }
}

/// Helper pinning a closure's signature so it coerces to [`PropertyFilter`].
pub fn from_fn<F>(f: F) -> F
where
    F: Fn(&PropertyDescriptor, EntityView<'_>) -> FilterOutcome,
{
    f
}

/// Filter that copies everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyAll;

impl PropertyFilter for CopyAll {
    fn filter(&self, _property: &PropertyDescriptor, _parent: EntityView<'_>) -> FilterOutcome {
        FilterOutcome::Copy
    }
}

/// Suppresses `property`, optionally only on instances of `on_type`
/// (subtypes included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressRule {
    /// Property name.
    pub property: String,
    /// Restricts the rule to instances of this type.
    #[serde(default)]
    pub on_type: Option<TypeName>,
}

impl SuppressRule {
    fn matches(&self, property: &PropertyDescriptor, parent: &EntityView<'_>) -> bool {
        self.property == property.name()
            && self
                .on_type
                .as_ref()
                .is_none_or(|ty| parent.is_a_type(ty))
    }
}

/// Data-driven filter: suppression rules plus an optional inverse allow-list.
///
/// Serialises as `{"suppress": [{"property": "...", "on_type": "..."}],
/// "inverse_allow": ["..."]}`; both fields may be omitted.
///
/// ```
/// use graft_core::RuleFilter;
///
/// let filter = RuleFilter::new()
///     .suppress_on("IFCPRODUCT", "Representation")
///     .allow_inverses(["IsDefinedBy"]);
/// assert_eq!(filter.suppress.len(), 1);
/// assert!(filter.inverse_allow.is_some_and(|names| names.contains("IsDefinedBy")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleFilter {
    /// Properties left unset.
    pub suppress: Vec<SuppressRule>,
    /// When present, only these inverse properties are followed.
    pub inverse_allow: Option<BTreeSet<String>>,
}

impl RuleFilter {
    /// Empty filter (copies everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule suppressing `property` on every type.
    pub fn suppress(mut self, property: &str) -> Self {
        self.suppress.push(SuppressRule {
            property: property.to_owned(),
            on_type: None,
        });
        self
    }

    /// Adds a rule suppressing `property` on instances of `ty`.
    pub fn suppress_on(mut self, ty: &str, property: &str) -> Self {
        self.suppress.push(SuppressRule {
            property: property.to_owned(),
            on_type: Some(TypeName::new(ty)),
        });
        self
    }

    /// Follows only the named inverse properties.
    pub fn allow_inverses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inverse_allow = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Building-model preset: products lose geometry and placement, type
    /// products lose their representation maps, space boundaries lose their
    /// connection geometry; only `IsDefinedBy` and `IsTypedBy` inverses are
    /// followed.
    pub fn semantic() -> Self {
        Self::new()
            .suppress_on("IFCPRODUCT", "Representation")
            .suppress_on("IFCPRODUCT", "ObjectPlacement")
            .suppress_on("IFCTYPEPRODUCT", "RepresentationMaps")
            .suppress_on("IFCRELSPACEBOUNDARY", "ConnectionGeometry")
            .allow_inverses(["IsDefinedBy", "IsTypedBy"])
    }
}

impl PropertyFilter for RuleFilter {
    fn filter(&self, property: &PropertyDescriptor, parent: EntityView<'_>) -> FilterOutcome {
        if property.is_inverse() {
            if let Some(allow) = &self.inverse_allow {
                if !allow.contains(property.name()) {
                    return FilterOutcome::Suppress;
                }
            }
        }
        if self.suppress.iter().any(|rule| rule.matches(property, &parent)) {
            FilterOutcome::Suppress
        } else {
            FilterOutcome::Copy
        }
    }
}
