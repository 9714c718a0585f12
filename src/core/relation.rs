//! Relation metadata declared by models
//!
//! Which side of a relationship holds the foreign key decides when a nested
//! operation on it can run: before the owner is saved, or after.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a relation, as reported by the persistence layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// The owner holds the foreign key to a single related row
    OwningToOne,
    /// Like [`RelationKind::OwningToOne`], plus a morph type column naming the related model
    OwningToOnePolymorphic,
    /// The related row holds the foreign key to the owner
    OwnedToOne,
    /// Many related rows hold the foreign key to the owner
    OwnedToMany,
    /// Rows are linked through a pivot table
    ManyToMany,
    /// Not a relation
    None,
}

impl RelationKind {
    pub fn is_relation(self) -> bool {
        self != RelationKind::None
    }

    /// Whether the owner needs this relation resolved before it is saved
    pub fn resolves_before_save(self) -> bool {
        matches!(
            self,
            RelationKind::OwningToOne | RelationKind::OwningToOnePolymorphic
        )
    }

    /// Whether this relation needs the owner's identity to resolve
    pub fn resolves_after_save(self) -> bool {
        matches!(
            self,
            RelationKind::OwnedToOne | RelationKind::OwnedToMany | RelationKind::ManyToMany
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::OwningToOne => "owning_to_one",
            RelationKind::OwningToOnePolymorphic => "owning_to_one_polymorphic",
            RelationKind::OwnedToOne => "owned_to_one",
            RelationKind::OwnedToMany => "owned_to_many",
            RelationKind::ManyToMany => "many_to_many",
            RelationKind::None => "none",
        };
        write!(f, "{}", name)
    }
}

/// A relation accessor on a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// The accessor name, matching the input field (e.g. "tasks")
    pub field: String,

    pub kind: RelationKind,

    /// The related model; absent for polymorphic owning relations,
    /// where the morph type column names it per row
    #[serde(default)]
    pub related: Option<String>,

    /// Foreign key column. Lives on the owner for owning kinds and on the
    /// related model for owned kinds. Unused for many-to-many.
    #[serde(default)]
    pub foreign_key: Option<String>,

    /// Column holding the related model name for polymorphic relations
    #[serde(default)]
    pub morph_type: Option<String>,

    /// Value written into `morph_type` by a polymorphic owned relation;
    /// defaults to the owner's model name
    #[serde(default)]
    pub morph_class: Option<String>,

    /// Pivot table for many-to-many relations
    #[serde(default)]
    pub pivot: Option<String>,

    /// Pivot column referencing the owner
    #[serde(default)]
    pub foreign_pivot_key: Option<String>,

    /// Pivot column referencing the related row
    #[serde(default)]
    pub related_pivot_key: Option<String>,
}

impl Relation {
    pub fn new(field: impl Into<String>, kind: RelationKind) -> Self {
        Self {
            field: field.into(),
            kind,
            related: None,
            foreign_key: None,
            morph_type: None,
            morph_class: None,
            pivot: None,
            foreign_pivot_key: None,
            related_pivot_key: None,
        }
    }

    pub fn related(mut self, model: impl Into<String>) -> Self {
        self.related = Some(model.into());
        self
    }

    pub fn foreign_key(mut self, column: impl Into<String>) -> Self {
        self.foreign_key = Some(column.into());
        self
    }

    pub fn morph_type(mut self, column: impl Into<String>) -> Self {
        self.morph_type = Some(column.into());
        self
    }

    /// Value written to the morph type column instead of the parent model name
    pub fn morph_class(mut self, class: impl Into<String>) -> Self {
        self.morph_class = Some(class.into());
        self
    }

    pub fn pivot(
        mut self,
        table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        self.pivot = Some(table.into());
        self.foreign_pivot_key = Some(foreign_pivot_key.into());
        self.related_pivot_key = Some(related_pivot_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_of_each_kind() {
        assert!(RelationKind::OwningToOne.resolves_before_save());
        assert!(RelationKind::OwningToOnePolymorphic.resolves_before_save());
        assert!(RelationKind::OwnedToOne.resolves_after_save());
        assert!(RelationKind::OwnedToMany.resolves_after_save());
        assert!(RelationKind::ManyToMany.resolves_after_save());
        assert!(!RelationKind::None.is_relation());
        assert!(!RelationKind::None.resolves_before_save());
        assert!(!RelationKind::None.resolves_after_save());
    }

    #[test]
    fn test_relation_from_yaml() {
        let yaml = r#"
            field: roles
            kind: many_to_many
            related: Role
            pivot: role_user
            foreign_pivot_key: user_id
            related_pivot_key: role_id
        "#;
        let relation: Relation = serde_yaml::from_str(yaml).expect("relation should parse");
        assert_eq!(relation.kind, RelationKind::ManyToMany);
        assert_eq!(relation.related.as_deref(), Some("Role"));
        assert_eq!(relation.pivot.as_deref(), Some("role_user"));
        assert!(relation.foreign_key.is_none());
    }

    #[test]
    fn test_display_matches_serde_name() {
        let kind = RelationKind::OwningToOnePolymorphic;
        let yaml = serde_yaml::to_string(&kind).expect("serialize");
        assert_eq!(yaml.trim(), kind.to_string());
    }
}
