//! Syllabus module business logic.

use crate::{
    core::{clean_opt, delete_or_404, ensure_exists, find_or_404},
    entities::{Module, Subject, module},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewModule {
    /// Module name
    pub name: String,
    /// Subject the module belongs to
    pub subject_id: Uuid,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
}

impl Validate for NewModule {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleChanges {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
}

impl Validate for ModuleChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFilter {
    /// Only modules of this subject
    pub subject_id: Option<Uuid>,
}

/// Lists modules in creation order.
pub async fn list_modules(
    db: &DatabaseConnection,
    filter: &ModuleFilter,
) -> Result<Vec<module::Model>> {
    Module::find()
        .apply_if(filter.subject_id, |q, v| {
            q.filter(module::Column::SubjectId.eq(v))
        })
        .order_by_asc(module::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one module.
pub async fn get_module(db: &DatabaseConnection, id: Uuid) -> Result<module::Model> {
    find_or_404::<Module, _>(db, "module", id).await
}

/// Creates a module for an existing subject.
#[instrument(skip(db))]
pub async fn create_module(db: &DatabaseConnection, input: NewModule) -> Result<module::Model> {
    input.validate()?;
    ensure_exists::<Subject, _>(db, "subject", input.subject_id).await?;

    let now = chrono::Utc::now();
    module::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        subject_id: Set(input.subject_id),
        description: Set(clean_opt(input.description)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Merges `changes` into an existing module.
#[instrument(skip(db))]
pub async fn update_module(
    db: &DatabaseConnection,
    id: Uuid,
    changes: ModuleChanges,
) -> Result<module::Model> {
    changes.validate()?;

    let mut module: module::ActiveModel = get_module(db, id).await?.into();
    if let Some(name) = changes.name {
        module.name = Set(name.trim().to_string());
    }
    if changes.description.is_some() {
        module.description = Set(clean_opt(changes.description));
    }
    module.updated_at = Set(chrono::Utc::now());
    module.update(db).await.map_err(Into::into)
}

/// Deletes a module.
#[instrument(skip(db))]
pub async fn delete_module(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<Module, _>(db, "module", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    #[tokio::test]
    async fn test_modules_for_subject() -> Result<()> {
        let db = setup_test_db().await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;
        let phase = create_test_phase(&db, year.id, "Phase I").await?;
        let subject = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;

        let created = create_module(
            &db,
            NewModule {
                name: "Upper Limb".to_string(),
                subject_id: subject.id,
                description: Some("  Bones and joints ".to_string()),
            },
        )
        .await?;
        assert_eq!(created.description.as_deref(), Some("Bones and joints"));

        let modules = list_modules(
            &db,
            &ModuleFilter {
                subject_id: Some(subject.id),
            },
        )
        .await?;
        assert_eq!(modules, vec![created]);
        Ok(())
    }

    #[tokio::test]
    async fn test_module_requires_subject() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_module(
            &db,
            NewModule {
                name: "Upper Limb".to_string(),
                subject_id: Uuid::new_v4(),
                description: None,
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
