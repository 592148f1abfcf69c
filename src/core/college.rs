//! College business logic - Handles all college-related operations.
//!
//! Provides functions for creating, listing, updating and deleting colleges.
//! All functions are async and return Result types for error handling.

use crate::{
    core::{clean_opt, delete_or_404, find_or_404},
    entities::{College, college},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollege {
    /// College name
    pub name: String,
    /// Optional short code
    #[serde(default)]
    pub code: Option<String>,
    /// Optional postal address
    #[serde(default)]
    pub address: Option<String>,
}

impl Validate for NewCollege {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        errors.into_result()
    }
}

/// Body of an update request; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeChanges {
    /// New name
    pub name: Option<String>,
    /// New code
    pub code: Option<String>,
    /// New address
    pub address: Option<String>,
}

impl Validate for CollegeChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        errors.into_result()
    }
}

/// Retrieves every college ordered by name.
pub async fn list_colleges(db: &DatabaseConnection) -> Result<Vec<college::Model>> {
    College::find()
        .order_by_asc(college::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one college.
pub async fn get_college(db: &DatabaseConnection, id: Uuid) -> Result<college::Model> {
    find_or_404::<College, _>(db, "college", id).await
}

/// Creates a college after validating the name.
#[instrument(skip(db))]
pub async fn create_college(db: &DatabaseConnection, input: NewCollege) -> Result<college::Model> {
    input.validate()?;

    let now = chrono::Utc::now();
    let college = college::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        code: Set(clean_opt(input.code)),
        address: Set(clean_opt(input.address)),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = college.insert(db).await?;
    info!(college_id = %created.id, "College created");
    Ok(created)
}

/// Merges `changes` into an existing college.
#[instrument(skip(db))]
pub async fn update_college(
    db: &DatabaseConnection,
    id: Uuid,
    changes: CollegeChanges,
) -> Result<college::Model> {
    changes.validate()?;

    let mut college: college::ActiveModel = get_college(db, id).await?.into();
    if let Some(name) = changes.name {
        college.name = Set(name.trim().to_string());
    }
    if changes.code.is_some() {
        college.code = Set(clean_opt(changes.code));
    }
    if changes.address.is_some() {
        college.address = Set(clean_opt(changes.address));
    }
    college.updated_at = Set(chrono::Utc::now());

    college.update(db).await.map_err(Into::into)
}

/// Deletes a college.
#[instrument(skip(db))]
pub async fn delete_college(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<College, _>(db, "college", id).await
}
