//! Phase entity - a batch within an academic year.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Phase (batch) database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phases")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Phase name (e.g., "Phase I")
    pub name: String,
    /// Academic year this phase runs in
    pub academic_year_id: Uuid,
    /// When the phase was created
    pub created_at: DateTimeUtc,
    /// When the phase was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::academic_year::Entity",
        from = "Column::AcademicYearId",
        to = "super::academic_year::Column::Id"
    )]
    AcademicYear,
    #[sea_orm(has_many = "super::subject::Entity")]
    Subjects,
}

impl Related<super::academic_year::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AcademicYear.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
