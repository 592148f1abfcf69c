//! Log-book template entity - a user-defined form schema.
//!
//! The `schema` column holds a [`crate::template::TemplateSchema`] document.
//! `subject` templates are scoped to one subject; `general` ones are not.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of template, deciding which references are mandatory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum TemplateType {
    /// Usable by any subject
    #[sea_orm(string_value = "general")]
    General,
    /// Bound to one subject; `subject_id` is required
    #[sea_orm(string_value = "subject")]
    Subject,
}

/// Log-book template database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logbook_templates")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Template name
    pub name: String,
    /// General or subject-scoped
    pub template_type: TemplateType,
    /// Subject the template is scoped to
    #[sea_orm(nullable)]
    pub subject_id: Option<Uuid>,
    /// College that owns the template
    #[sea_orm(nullable)]
    pub college_id: Option<Uuid>,
    /// Field groups document
    pub schema: Json,
    /// When the template was created
    pub created_at: DateTimeUtc,
    /// When the template was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `LogBookTemplate` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One template shapes many entries
    #[sea_orm(has_many = "super::logbook_entry::Entity")]
    Entries,
}

impl Related<super::logbook_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
