//! User entity - login accounts for every role.
//!
//! Student and teacher accounts are created together with their profile;
//! administrators create college-admin accounts directly. The password hash
//! is never serialized into API responses.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role, driving dashboard routing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Student account
    #[sea_orm(string_value = "STUDENT")]
    Student,
    /// Teacher account
    #[sea_orm(string_value = "TEACHER")]
    Teacher,
    /// Administrator of one college
    #[sea_orm(string_value = "COLLEGE_ADMIN")]
    CollegeAdmin,
    /// System administrator
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Role {
    /// Wire representation, e.g. `"COLLEGE_ADMIN"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "STUDENT",
            Self::Teacher => "TEACHER",
            Self::CollegeAdmin => "COLLEGE_ADMIN",
            Self::Admin => "ADMIN",
        }
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Login email, unique across all accounts
    #[sea_orm(unique)]
    pub email: String,
    /// Display name
    pub name: String,
    /// Argon2 PHC string
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Account role
    pub role: Role,
    /// College the account belongs to (none for system admins)
    #[sea_orm(nullable)]
    pub college_id: Option<Uuid>,
    /// Set until the user changes the temporary password
    pub is_first_login: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::student_profile::Entity")]
    StudentProfile,
    #[sea_orm(has_one = "super::teacher_profile::Entity")]
    TeacherProfile,
}

impl Related<super::student_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentProfile.def()
    }
}

impl Related<super::teacher_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TeacherProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
