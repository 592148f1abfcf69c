//! Log-book entry entity - one filled-in template.
//!
//! `data` is a flat JSON object keyed by the template's field names. Keys are
//! checked against the template when the entry is written; later template
//! edits do not touch stored entries.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Log-book entry database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logbook_entries")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Template the entry was filled against
    pub template_id: Uuid,
    /// Student profile that wrote the entry
    pub student_id: Uuid,
    /// Subject reference
    #[sea_orm(nullable)]
    pub subject_id: Option<Uuid>,
    /// Course reference
    #[sea_orm(nullable)]
    pub course_id: Option<Uuid>,
    /// Batch (phase) reference
    #[sea_orm(nullable)]
    pub phase_id: Option<Uuid>,
    /// Field values keyed by field name
    pub data: Json,
    /// Remarks written by the student
    #[sea_orm(column_type = "Text", nullable)]
    pub student_remarks: Option<String>,
    /// Remarks written by the reviewing teacher
    #[sea_orm(column_type = "Text", nullable)]
    pub teacher_remarks: Option<String>,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the entry was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::logbook_template::Entity",
        from = "Column::TemplateId",
        to = "super::logbook_template::Column::Id"
    )]
    Template,
    #[sea_orm(
        belongs_to = "super::student_profile::Entity",
        from = "Column::StudentId",
        to = "super::student_profile::Column::Id"
    )]
    Student,
}

impl Related<super::logbook_template::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Template.def()
    }
}

impl Related<super::student_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
