//! Database configuration for Elog Book.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Creation uses `IF NOT EXISTS` and is safe to run on every start.

use crate::entities::{
    AcademicYear, Branch, College, Course, LogBookEntry, LogBookTemplate, Module, Phase,
    StudentProfile, StudentSubject, Subject, TeacherProfile, TeacherSubject, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/elog_book.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or
/// returns the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables, parents before children.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, College).await?;
    create_table(db, &schema, Course).await?;
    create_table(db, &schema, Branch).await?;
    create_table(db, &schema, AcademicYear).await?;
    create_table(db, &schema, Phase).await?;
    create_table(db, &schema, Subject).await?;
    create_table(db, &schema, Module).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, StudentProfile).await?;
    create_table(db, &schema, TeacherProfile).await?;
    create_table(db, &schema, TeacherSubject).await?;
    create_table(db, &schema, StudentSubject).await?;
    create_table(db, &schema, LogBookTemplate).await?;
    create_table(db, &schema, LogBookEntry).await?;

    info!("Database tables ensured.");
    Ok(())
}
