//! Splits an argument set by when each field can be resolved
//!
//! Relative to the save of the record the arguments belong to:
//!
//! ```text
//!   before    owning to-one relations (the owner needs the foreign key)
//!   regular   plain attributes
//!   after     owned and many-to-many relations (they need the owner's key)
//! ```

use crate::core::argument::{Argument, ArgumentSet};
use crate::core::relation::RelationKind;
use crate::core::store::RecordStore;
use indexmap::IndexMap;

/// The model whose relations decide the partition
#[derive(Clone, Copy)]
pub struct Owner<'a> {
    pub store: &'a dyn RecordStore,
    pub model: &'a str,
}

impl<'a> Owner<'a> {
    pub fn new(store: &'a dyn RecordStore, model: &'a str) -> Self {
        Self { store, model }
    }
}

/// Which relation interpreter resolves each relation field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionPlan {
    resolvers: IndexMap<String, RelationKind>,
}

impl ResolutionPlan {
    /// Relation kind bound to `field`, `RelationKind::None` if unbound
    pub fn kind(&self, field: &str) -> RelationKind {
        self.resolvers
            .get(field)
            .copied()
            .unwrap_or(RelationKind::None)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, RelationKind)> {
        self.resolvers.iter().map(|(field, kind)| (field.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    fn bind(&mut self, field: &str, kind: RelationKind) {
        self.resolvers.insert(field.to_string(), kind);
    }
}

/// The three buckets of a partitioned argument set, in declaration order
#[derive(Debug, Default)]
pub struct Partitioned {
    pub before: IndexMap<String, Argument>,
    pub regular: IndexMap<String, Argument>,
    pub after: IndexMap<String, Argument>,
    pub plan: ResolutionPlan,
}

impl Partitioned {
    /// Field names over all buckets
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.before
            .keys()
            .chain(self.regular.keys())
            .chain(self.after.keys())
            .map(String::as_str)
    }
}

/// Partition the supplied fields of `args`
///
/// Without an owner there are no relations to look up, so every field is
/// regular.
pub fn partition(args: ArgumentSet, owner: Option<Owner<'_>>) -> Partitioned {
    let mut partitioned = Partitioned::default();

    for (field, argument) in args {
        let kind = owner
            .map(|owner| owner.store.relation_kind(owner.model, &field))
            .unwrap_or(RelationKind::None);

        // Polymorphic owning is matched ahead of plain owning
        match kind {
            RelationKind::OwningToOnePolymorphic | RelationKind::OwningToOne => {
                tracing::trace!(field = %field, kind = %kind, "Resolving before save");
                partitioned.plan.bind(&field, kind);
                partitioned.before.insert(field, argument);
            }
            RelationKind::OwnedToOne | RelationKind::OwnedToMany | RelationKind::ManyToMany => {
                tracing::trace!(field = %field, kind = %kind, "Resolving after save");
                partitioned.plan.bind(&field, kind);
                partitioned.after.insert(field, argument);
            }
            RelationKind::None => {
                partitioned.regular.insert(field, argument);
            }
        }
    }

    partitioned
}
