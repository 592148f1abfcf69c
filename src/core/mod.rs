//! Core business logic - framework-agnostic operations for every entity.
//!
//! Each module validates its input, performs a single query (or a short,
//! explicitly documented sequence) through `SeaORM`, and returns entity models.
//! The HTTP layer in `api` is a thin translation on top of these functions.

/// Academic years
pub mod academic_year;
/// Branches of a course
pub mod branch;
/// Colleges
pub mod college;
/// Courses
pub mod course;
/// Role-based landing resolution
pub mod landing;
/// Log-book entries
pub mod logbook_entry;
/// Log-book templates
pub mod logbook_template;
/// Syllabus modules of a subject
pub mod module;
/// Phases (batches)
pub mod phase;
/// Student profiles, verification and search
pub mod student;
/// Student enrollments
pub mod student_subject;
/// Subjects
pub mod subject;
/// Teacher profiles and search
pub mod teacher;
/// Teacher-subject assignments
pub mod teacher_subject;
/// CSV import/export and printable reports
pub mod transfer;
/// User accounts and passwords
pub mod user;

use crate::errors::{Error, Result};
use sea_orm::{ConnectionTrait, EntityTrait, PrimaryKeyTrait, sea_query::LikeExpr};
use uuid::Uuid;

/// Default number of rows returned by search endpoints.
pub const DEFAULT_SEARCH_LIMIT: u64 = 20;
/// Upper bound for search `limit`.
pub const MAX_SEARCH_LIMIT: u64 = 100;

/// Clamps a requested search limit into `1..=MAX_SEARCH_LIMIT`.
#[must_use]
pub fn search_limit(requested: Option<u64>) -> u64 {
    requested.map_or(DEFAULT_SEARCH_LIMIT, |l| l.clamp(1, MAX_SEARCH_LIMIT))
}

const LIKE_ESCAPE: char = '!';

/// `LIKE` pattern matching `needle` anywhere, with `%`, `_` and the escape
/// character taken literally.
#[must_use]
pub fn contains_pattern(needle: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

/// Fetches a row by primary key or fails with [`Error::NotFound`].
pub async fn find_or_404<E, C>(db: &C, entity: &'static str, id: Uuid) -> Result<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    E::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found(entity, id))
}

/// Fails with [`Error::NotFound`] unless a row with this primary key exists.
pub async fn ensure_exists<E, C>(db: &C, entity: &'static str, id: Uuid) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    find_or_404::<E, C>(db, entity, id).await.map(|_| ())
}

/// Same as [`ensure_exists`] for an optional reference.
pub async fn ensure_exists_opt<E, C>(db: &C, entity: &'static str, id: Option<Uuid>) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    match id {
        Some(id) => ensure_exists::<E, C>(db, entity, id).await,
        None => Ok(()),
    }
}

/// Deletes a row by primary key; [`Error::NotFound`] when nothing was deleted.
pub async fn delete_or_404<E, C>(db: &C, entity: &'static str, id: Uuid) -> Result<()>
where
    E: EntityTrait,
    C: ConnectionTrait,
    Uuid: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    let result = E::delete_by_id(id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found(entity, id));
    }
    Ok(())
}

/// Trims an optional string, mapping blank values to `None`.
#[must_use]
pub fn clean_opt(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_limit_clamps() {
        assert_eq!(search_limit(None), DEFAULT_SEARCH_LIMIT);
        assert_eq!(search_limit(Some(0)), 1);
        assert_eq!(search_limit(Some(5)), 5);
        assert_eq!(search_limit(Some(5000)), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn test_clean_opt() {
        assert_eq!(clean_opt(Some("  x ".to_string())), Some("x".to_string()));
        assert_eq!(clean_opt(Some("   ".to_string())), None);
        assert_eq!(clean_opt(None), None);
    }
}
