//! Phase business logic - batches within an academic year.

use crate::{
    core::{delete_or_404, ensure_exists, find_or_404},
    entities::{AcademicYear, Phase, phase},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhase {
    /// Phase name
    pub name: String,
    /// Academic year the phase belongs to
    pub academic_year_id: Uuid,
}

impl Validate for NewPhase {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseChanges {
    /// New name
    pub name: Option<String>,
    /// Move to another academic year
    pub academic_year_id: Option<Uuid>,
}

impl Validate for PhaseChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        errors.into_result()
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseFilter {
    /// Only phases of this academic year
    pub academic_year_id: Option<Uuid>,
}

/// Lists phases.
pub async fn list_phases(db: &DatabaseConnection, filter: &PhaseFilter) -> Result<Vec<phase::Model>> {
    Phase::find()
        .apply_if(filter.academic_year_id, |q, v| {
            q.filter(phase::Column::AcademicYearId.eq(v))
        })
        .order_by_asc(phase::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one phase.
pub async fn get_phase(db: &DatabaseConnection, id: Uuid) -> Result<phase::Model> {
    find_or_404::<Phase, _>(db, "phase", id).await
}

/// Creates a phase in an existing academic year.
#[instrument(skip(db))]
pub async fn create_phase(db: &DatabaseConnection, input: NewPhase) -> Result<phase::Model> {
    input.validate()?;
    ensure_exists::<AcademicYear, _>(db, "academic year", input.academic_year_id).await?;

    let now = chrono::Utc::now();
    phase::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        academic_year_id: Set(input.academic_year_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Merges `changes` into an existing phase.
#[instrument(skip(db))]
pub async fn update_phase(
    db: &DatabaseConnection,
    id: Uuid,
    changes: PhaseChanges,
) -> Result<phase::Model> {
    changes.validate()?;

    let mut phase: phase::ActiveModel = get_phase(db, id).await?.into();
    if let Some(name) = changes.name {
        phase.name = Set(name.trim().to_string());
    }
    if let Some(year_id) = changes.academic_year_id {
        ensure_exists::<AcademicYear, _>(db, "academic year", year_id).await?;
        phase.academic_year_id = Set(year_id);
    }
    phase.updated_at = Set(chrono::Utc::now());
    phase.update(db).await.map_err(Into::into)
}

/// Deletes a phase.
#[instrument(skip(db))]
pub async fn delete_phase(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<Phase, _>(db, "phase", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    #[tokio::test]
    async fn test_phases_filtered_by_year() -> Result<()> {
        let db = setup_test_db().await?;
        let year_a = create_test_academic_year(&db, "2023-2024").await?;
        let year_b = create_test_academic_year(&db, "2024-2025").await?;
        create_test_phase(&db, year_a.id, "Phase I").await?;
        create_test_phase(&db, year_b.id, "Phase I").await?;
        create_test_phase(&db, year_b.id, "Phase II").await?;

        let phases = list_phases(
            &db,
            &PhaseFilter {
                academic_year_id: Some(year_b.id),
            },
        )
        .await?;
        assert_eq!(phases.len(), 2);
        assert!(phases.iter().all(|p| p.academic_year_id == year_b.id));
        Ok(())
    }

    #[tokio::test]
    async fn test_create_phase_missing_year() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_phase(
            &db,
            NewPhase {
                name: "Phase I".to_string(),
                academic_year_id: Uuid::new_v4(),
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_unknown_phase() -> Result<()> {
        let db = setup_test_db().await?;
        let result = update_phase(&db, Uuid::new_v4(), PhaseChanges::default()).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
