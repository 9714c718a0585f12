//! Model and relation configuration loading

use crate::core::error::DefinitionError;
use crate::core::relation::{Relation, RelationKind};
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Configuration for one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name, matching the GraphQL object type (e.g. "User")
    pub name: String,

    /// Primary key column
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Relation accessors declared on this model
    #[serde(default)]
    pub relations: Vec<Relation>,
}

fn default_primary_key() -> String {
    "id".to_string()
}

impl ModelConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: default_primary_key(),
            relations: Vec::new(),
        }
    }

    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn find_relation(&self, field: &str) -> Option<&Relation> {
        self.relations.iter().find(|r| r.field == field)
    }
}

/// Complete model configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub models: Vec<ModelConfig>,
}

impl ModelsConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn find_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn find_relation(&self, model: &str, field: &str) -> Option<&Relation> {
        self.find_model(model)?.find_relation(field)
    }

    /// Primary key of `model`, "id" for unknown models
    pub fn primary_key(&self, model: &str) -> &str {
        self.find_model(model)
            .map(|m| m.primary_key.as_str())
            .unwrap_or("id")
    }

    /// Check that every relation carries the columns its kind needs
    pub fn validate(&self) -> Result<(), DefinitionError> {
        for model in &self.models {
            for relation in &model.relations {
                validate_relation(&model.name, relation)?;
            }
        }
        Ok(())
    }
}

fn validate_relation(model: &str, relation: &Relation) -> Result<(), DefinitionError> {
    let missing = |what: &str| DefinitionError::InvalidSchema {
        message: format!(
            "relation '{}' on {} ({}) requires '{}'",
            relation.field, model, relation.kind, what
        ),
    };

    match relation.kind {
        RelationKind::OwningToOne | RelationKind::OwnedToOne | RelationKind::OwnedToMany => {
            relation.related.as_ref().ok_or_else(|| missing("related"))?;
            relation.foreign_key.as_ref().ok_or_else(|| missing("foreign_key"))?;
        }
        RelationKind::OwningToOnePolymorphic => {
            relation.foreign_key.as_ref().ok_or_else(|| missing("foreign_key"))?;
            relation.morph_type.as_ref().ok_or_else(|| missing("morph_type"))?;
        }
        RelationKind::ManyToMany => {
            relation.related.as_ref().ok_or_else(|| missing("related"))?;
            relation.pivot.as_ref().ok_or_else(|| missing("pivot"))?;
            relation
                .foreign_pivot_key
                .as_ref()
                .ok_or_else(|| missing("foreign_pivot_key"))?;
            relation
                .related_pivot_key
                .as_ref()
                .ok_or_else(|| missing("related_pivot_key"))?;
        }
        RelationKind::None => {
            return Err(DefinitionError::InvalidSchema {
                message: format!("relation '{}' on {} has kind none", relation.field, model),
            });
        }
    }
    Ok(())
}
