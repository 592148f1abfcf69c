//! Academic year business logic.
//!
//! Dates are accepted as `YYYY-MM-DD` or as full timestamps and always stored
//! and returned as plain calendar dates.

use crate::{
    core::{delete_or_404, ensure_exists_opt, find_or_404},
    entities::{AcademicYear, College, academic_year},
    errors::Result,
    validation::{FieldErrors, Validate, flexible_date, flexible_date_opt},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAcademicYear {
    /// Display name, e.g. `"2024-2025"`
    pub name: String,
    /// First day
    #[serde(deserialize_with = "flexible_date")]
    pub start_date: NaiveDate,
    /// Last day
    #[serde(deserialize_with = "flexible_date")]
    pub end_date: NaiveDate,
    /// Scope to one college
    #[serde(default)]
    pub college_id: Option<Uuid>,
}

impl Validate for NewAcademicYear {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        check_range(&mut errors, self.start_date, self.end_date);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearChanges {
    /// New name
    pub name: Option<String>,
    /// New first day
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub start_date: Option<NaiveDate>,
    /// New last day
    #[serde(default, deserialize_with = "flexible_date_opt")]
    pub end_date: Option<NaiveDate>,
}

impl Validate for AcademicYearChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        errors.into_result()
    }
}

fn check_range(errors: &mut FieldErrors, start: NaiveDate, end: NaiveDate) {
    if end <= start {
        errors.add("endDate", "must be after startDate");
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcademicYearFilter {
    /// Only years scoped to this college
    pub college_id: Option<Uuid>,
}

/// Lists academic years, most recent first.
pub async fn list_academic_years(
    db: &DatabaseConnection,
    filter: &AcademicYearFilter,
) -> Result<Vec<academic_year::Model>> {
    AcademicYear::find()
        .apply_if(filter.college_id, |q, v| {
            q.filter(academic_year::Column::CollegeId.eq(v))
        })
        .order_by_desc(academic_year::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one academic year.
pub async fn get_academic_year(db: &DatabaseConnection, id: Uuid) -> Result<academic_year::Model> {
    find_or_404::<AcademicYear, _>(db, "academic year", id).await
}

/// Creates an academic year.
#[instrument(skip(db))]
pub async fn create_academic_year(
    db: &DatabaseConnection,
    input: NewAcademicYear,
) -> Result<academic_year::Model> {
    input.validate()?;
    ensure_exists_opt::<College, _>(db, "college", input.college_id).await?;

    let now = chrono::Utc::now();
    let created = academic_year::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        start_date: Set(input.start_date),
        end_date: Set(input.end_date),
        college_id: Set(input.college_id),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(academic_year_id = %created.id, name = %created.name, "Academic year created");
    Ok(created)
}

/// Merges `changes` into an existing academic year. The resulting range must
/// still end after it starts.
#[instrument(skip(db))]
pub async fn update_academic_year(
    db: &DatabaseConnection,
    id: Uuid,
    changes: AcademicYearChanges,
) -> Result<academic_year::Model> {
    changes.validate()?;

    let current = get_academic_year(db, id).await?;
    let start = changes.start_date.unwrap_or(current.start_date);
    let end = changes.end_date.unwrap_or(current.end_date);
    let mut errors = FieldErrors::new();
    check_range(&mut errors, start, end);
    errors.into_result()?;

    let mut year: academic_year::ActiveModel = current.into();
    if let Some(name) = changes.name {
        year.name = Set(name.trim().to_string());
    }
    year.start_date = Set(start);
    year.end_date = Set(end);
    year.updated_at = Set(chrono::Utc::now());
    year.update(db).await.map_err(Into::into)
}

/// Deletes an academic year.
#[instrument(skip(db))]
pub async fn delete_academic_year(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<AcademicYear, _>(db, "academic year", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*, validation::from_json};
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trip_normalizes_dates() -> Result<()> {
        let db = setup_test_db().await?;

        let input: NewAcademicYear = from_json(json!({
            "name": "2024-2025",
            "startDate": "2024-06-01T00:00:00.000Z",
            "endDate": "2025-05-31"
        }))?;
        let created = create_academic_year(&db, input).await?;

        let fetched = get_academic_year(&db, created.id).await?;
        let body = serde_json::to_value(&fetched)?;
        assert_eq!(body["name"], "2024-2025");
        assert_eq!(body["startDate"], "2024-06-01");
        assert_eq!(body["endDate"], "2025-05-31");
        Ok(())
    }

    #[tokio::test]
    async fn test_end_must_follow_start() -> Result<()> {
        let db = setup_test_db().await?;
        let input: NewAcademicYear = from_json(json!({
            "name": "2025-2024",
            "startDate": "2025-06-01",
            "endDate": "2024-05-31"
        }))?;
        let result = create_academic_year(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        assert!(
            list_academic_years(&db, &AcademicYearFilter::default())
                .await?
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_update_checks_merged_range() -> Result<()> {
        let db = setup_test_db().await?;
        let year = create_test_academic_year(&db, "2024-2025").await?;

        let bad = update_academic_year(
            &db,
            year.id,
            AcademicYearChanges {
                end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(bad.unwrap_err(), Error::Validation { .. }));

        let good = update_academic_year(
            &db,
            year.id,
            AcademicYearChanges {
                end_date: NaiveDate::from_ymd_opt(2025, 4, 30),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(good.start_date, year.start_date);
        assert_eq!(good.end_date, NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
        Ok(())
    }

    #[test]
    fn test_invalid_date_is_rejected_at_parse() {
        let result = from_json::<NewAcademicYear>(json!({
            "name": "2024-2025",
            "startDate": "June 1st",
            "endDate": "2025-05-31"
        }));
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
    }
}
