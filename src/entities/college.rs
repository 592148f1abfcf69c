//! College entity - the top of the academic hierarchy.
//!
//! Courses, academic years, users and profiles all reference a college
//! through `college_id`. This is the only tenant boundary in the system.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// College database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "colleges")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Display name of the college
    pub name: String,
    /// Short institutional code
    #[sea_orm(nullable)]
    pub code: Option<String>,
    /// Postal address
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    /// When the college was created
    pub created_at: DateTimeUtc,
    /// When the college was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between College and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One college offers many courses
    #[sea_orm(has_many = "super::course::Entity")]
    Courses,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Courses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
