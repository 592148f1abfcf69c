//! Student profile entity - identity and placement of a student.
//!
//! New profiles start `PENDING`; a reviewer moves them to `APPROVED` or
//! `REJECTED` exactly once.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Verification status of a student profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// Awaiting review
    #[sea_orm(string_value = "PENDING")]
    #[default]
    Pending,
    /// Accepted by a reviewer
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Refused by a reviewer
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl VerificationStatus {
    /// Wire representation, e.g. `"PENDING"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Whether a reviewer may move a profile from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved | Self::Rejected)
        )
    }
}

/// Student profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "student_profiles")]
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
    /// College enrollment / roll number
    pub enrollment_number: String,
    /// Contact number
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    /// URL of the profile picture on the image host
    #[sea_orm(nullable)]
    pub profile_image: Option<String>,
    /// Verification status
    pub status: VerificationStatus,
    /// Note left by the reviewer
    #[sea_orm(column_type = "Text", nullable)]
    pub review_note: Option<String>,
    /// College the student is enrolled in
    pub college_id: Uuid,
    /// Branch, if assigned
    #[sea_orm(nullable)]
    pub branch_id: Option<Uuid>,
    /// Course, if assigned
    #[sea_orm(nullable)]
    pub course_id: Option<Uuid>,
    /// Academic year of admission
    #[sea_orm(nullable)]
    pub academic_year_id: Option<Uuid>,
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
    #[sea_orm(
        belongs_to = "super::college::Entity",
        from = "Column::CollegeId",
        to = "super::college::Column::Id"
    )]
    College,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::college::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::College.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
