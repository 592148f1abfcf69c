//! Course business logic - courses offered by a college.

use crate::{
    core::{delete_or_404, ensure_exists, find_or_404},
    entities::{College, Course, course},
    errors::Result,
    validation::{FieldErrors, Validate},
};
use sea_orm::{QueryOrder, QueryTrait, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Body of a create request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    /// Course name
    pub name: String,
    /// Owning college
    pub college_id: Uuid,
    /// Nominal duration in years
    #[serde(default)]
    pub duration_years: Option<i32>,
}

impl Validate for NewCourse {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name("name", &self.name);
        check_duration(&mut errors, self.duration_years);
        errors.into_result()
    }
}

/// Body of an update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseChanges {
    /// New name
    pub name: Option<String>,
    /// New duration
    pub duration_years: Option<i32>,
}

impl Validate for CourseChanges {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        errors.check_name_opt("name", self.name.as_deref());
        check_duration(&mut errors, self.duration_years);
        errors.into_result()
    }
}

fn check_duration(errors: &mut FieldErrors, years: Option<i32>) {
    if years.is_some_and(|y| !(1..=10).contains(&y)) {
        errors.add("durationYears", "must be between 1 and 10");
    }
}

/// Recognised list filters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    /// Only courses of this college
    pub college_id: Option<Uuid>,
}

/// Lists courses, optionally restricted to one college.
pub async fn list_courses(db: &DatabaseConnection, filter: &CourseFilter) -> Result<Vec<course::Model>> {
    Course::find()
        .apply_if(filter.college_id, |q, v| {
            q.filter(course::Column::CollegeId.eq(v))
        })
        .order_by_asc(course::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one course.
pub async fn get_course(db: &DatabaseConnection, id: Uuid) -> Result<course::Model> {
    find_or_404::<Course, _>(db, "course", id).await
}

/// Creates a course under an existing college.
#[instrument(skip(db))]
pub async fn create_course(db: &DatabaseConnection, input: NewCourse) -> Result<course::Model> {
    input.validate()?;
    ensure_exists::<College, _>(db, "college", input.college_id).await?;

    let now = chrono::Utc::now();
    let created = course::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(input.name.trim().to_string()),
        college_id: Set(input.college_id),
        duration_years: Set(input.duration_years),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await?;
    info!(course_id = %created.id, college_id = %created.college_id, "Course created");
    Ok(created)
}

/// Merges `changes` into an existing course.
#[instrument(skip(db))]
pub async fn update_course(
    db: &DatabaseConnection,
    id: Uuid,
    changes: CourseChanges,
) -> Result<course::Model> {
    changes.validate()?;

    let mut course: course::ActiveModel = get_course(db, id).await?.into();
    if let Some(name) = changes.name {
        course.name = Set(name.trim().to_string());
    }
    if let Some(years) = changes.duration_years {
        course.duration_years = Set(Some(years));
    }
    course.updated_at = Set(chrono::Utc::now());
    course.update(db).await.map_err(Into::into)
}

/// Deletes a course.
#[instrument(skip(db))]
pub async fn delete_course(db: &DatabaseConnection, id: Uuid) -> Result<()> {
    delete_or_404::<Course, _>(db, "course", id).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::*};

    #[tokio::test]
    async fn test_create_course_requires_existing_college() -> Result<()> {
        let db = setup_test_db().await?;
        let result = create_course(
            &db,
            NewCourse {
                name: "MBBS".to_string(),
                college_id: Uuid::new_v4(),
                duration_years: Some(5),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { entity: "college", .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_duration_bounds() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "Test College").await?;
        let result = create_course(
            &db,
            NewCourse {
                name: "MBBS".to_string(),
                college_id: college.id,
                duration_years: Some(0),
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_courses_by_college() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_college(&db, "First College").await?;
        let second = create_test_college(&db, "Second College").await?;
        create_test_course(&db, first.id, "MBBS").await?;
        create_test_course(&db, first.id, "BDS").await?;
        create_test_course(&db, second.id, "BSc Nursing").await?;

        let all = list_courses(&db, &CourseFilter::default()).await?;
        assert_eq!(all.len(), 3);

        let filtered = list_courses(
            &db,
            &CourseFilter {
                college_id: Some(first.id),
            },
        )
        .await?;
        let names: Vec<_> = filtered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["BDS", "MBBS"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_course() -> Result<()> {
        let db = setup_test_db().await?;
        let college = create_test_college(&db, "Test College").await?;
        let course = create_test_course(&db, college.id, "MBBS").await?;

        let updated = update_course(
            &db,
            course.id,
            CourseChanges {
                duration_years: Some(6),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.name, "MBBS");
        assert_eq!(updated.duration_years, Some(6));
        Ok(())
    }
}
