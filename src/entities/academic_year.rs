//! Academic year entity - a named date range such as "2024-2025".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Academic year database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "academic_years")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Display name, usually `"YYYY-YYYY"`
    pub name: String,
    /// First day of the year
    pub start_date: Date,
    /// Last day of the year
    pub end_date: Date,
    /// College the year is scoped to, if any
    #[sea_orm(nullable)]
    pub college_id: Option<Uuid>,
    /// When the year was created
    pub created_at: DateTimeUtc,
    /// When the year was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `AcademicYear` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One academic year is split into many phases
    #[sea_orm(has_many = "super::phase::Entity")]
    Phases,
}

impl Related<super::phase::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
