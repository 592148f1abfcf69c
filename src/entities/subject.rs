//! Subject entity - a taught subject within a phase.
//!
//! Subjects carry an approval flag set by a college administrator; log-book
//! templates of type `subject` and teacher assignments reference them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subject database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subjects")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Subject name (e.g., "Anatomy")
    pub name: String,
    /// Subject code (e.g., "AN101")
    pub code: String,
    /// Phase the subject is taught in
    pub phase_id: Uuid,
    /// Course the subject belongs to, if recorded
    #[sea_orm(nullable)]
    pub course_id: Option<Uuid>,
    /// Whether an administrator approved the subject
    pub is_approved: bool,
    /// When the subject was created
    pub created_at: DateTimeUtc,
    /// When the subject was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Subject and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subject belongs to one phase
    #[sea_orm(
        belongs_to = "super::phase::Entity",
        from = "Column::PhaseId",
        to = "super::phase::Column::Id"
    )]
    Phase,
    /// One subject is split into many modules
    #[sea_orm(has_many = "super::module::Entity")]
    Modules,
}

impl Related<super::phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phase.def()
    }
}

impl Related<super::module::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Modules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
