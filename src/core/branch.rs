//! Branch business logic - specialisations within a course.

use crate::{
    core::{delete_or_404, ensure_exists, find_or_404},
    entities::{Branch, Course, branch},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBranch {
    /// Branch name
    pub name: String,
    /// Parent course
    pub course_id: Uuid,
}

impl Validate for NewBranch {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchChanges {
    /// New name
    pub name: Option<String>,
    /// Move the branch to another course
    pub course_id: Option<Uuid>,
}

impl Validate for BranchChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchFilter {
    /// Only branches of this course
    pub course_id: Option<Uuid>,
}

/// Lists branches.
pub async fn list_branches(db: &DatabaseConnection, filter: &BranchFilter) -> Result<Vec<branch::Model>> {
    Branch::find()
        .apply_if(filter.course_id, |q, v| q.filter(branch::Column::CourseId.eq(v)))
        .order_by_asc(branch::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one branch.
pub async fn get_branch(db: &DatabaseConnection, id: Uuid) -> Result<branch::Model> {
    find_or_404::<Branch, _>(db, "branch", id).await
}

/// Creates a branch under an existing course.
#[instrument(skip(db))]
pub async fn create_branch(db: &DatabaseConnection, input: NewBranch) -> Result<branch::Model> {
    input.validate()?;
    ensure_exists::<Course, _>(db, "course", input.course_id).await?;

    let now = chrono::Utc::now();
    branch::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        course_id: Set(input.course_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Merges `changes` into an existing branch.
#[instrument(skip(db))]
pub async fn update_branch(
    db: &DatabaseConnection,
    id: Uuid,
    changes: BranchChanges,
) -> Result<branch::Model> {
    changes.validate()?;

    let mut branch: branch::ActiveModel = get_branch(db, id).await?.into();
    if let Some(name) = changes.name {
        branch.name = Set(name.trim().to_string());
    }
    if let Some(course_id) = changes.course_id {
        ensure_exists::<Course, _>(db, "course", course_id).await?;
        branch.course_id = Set(course_id);
    }
    branch.updated_at = Set(chrono::Utc::now());
    branch.update(db).await.map_err(Into::into)
}

/// Deletes a branch.
#[instrument(skip(db))]
pub async fn delete_branch(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<Branch, _>(db, "branch", id).await
}
