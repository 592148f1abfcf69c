//! Teacher profile entity - identity and employment details of a teacher.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Teacher profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teacher_profiles")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Owning user account, one profile per account
    #[sea_orm(unique)]
    pub user_id: Uuid,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Job title (e.g., "Associate Professor")
    pub designation: String,
    /// College employee number
    pub employee_id: String,
    /// Date the teacher joined
    pub joining_date: Date,
    /// Contact number
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    /// URL of the profile picture on the image host
    #[sea_orm(nullable)]
    pub profile_image: Option<String>,
    /// Employing college
    pub college_id: Uuid,
    /// When the profile was created
    pub created_at: DateTimeUtc,
    /// When the profile was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::teacher_subject::Entity")]
    TeacherSubjects,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::teacher_subject::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherSubjects.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
