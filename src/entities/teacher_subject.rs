//! Teacher-subject entity - assignment of a teacher to a subject for one
//! academic year and phase.
//!
//! Rows are unique per (teacher, subject, academic year, phase). The set for a
//! given (teacher, academic year, phase) is replaced wholesale on reassignment.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Teacher-subject database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher_subjects")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Assigned teacher profile
    pub teacher_id: Uuid,
    /// Assigned subject
    pub subject_id: Uuid,
    /// Academic year of the assignment
    pub academic_year_id: Uuid,
    /// Phase of the assignment
    pub phase_id: Uuid,
    /// When the assignment was made
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teacher_profile::Entity",
        from = "Column::TeacherId",
        to = "super::teacher_profile::Column::Id"
    )]
    Teacher,
    #[sea_orm(
        belongs_to = "super::subject::Entity",
        from = "Column::SubjectId",
        to = "super::subject::Column::Id"
    )]
    Subject,
}

impl Related<super::teacher_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
