//! Shared test utilities for Elog Book.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    config::Settings,
    core::{
        academic_year::{self, NewAcademicYear},
        college::{self, NewCollege},
        course::{self, NewCourse},
        logbook_template::{self, NewTemplate},
        phase::{self, NewPhase},
        student::{self, NewStudent},
        subject::{self, NewSubject},
        teacher::{self, NewTeacher},
        user::AccountRef,
    },
    entities,
    errors::{Error, Result},
    notify::{Mailer, OutgoingEmail},
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use std::sync::Mutex;
use uuid::Uuid;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Settings with `res.cloudinary.com` as the only allowed image host.
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.images.allowed_domains = vec!["res.cloudinary.com".to_string()];
    settings
}

/// Mailer that keeps every message in memory, optionally failing each send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    /// A mailer whose every delivery fails.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    /// Messages delivered so far.
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<()> {
        if self.fail {
            return Err(Error::Email {
                message: "smtp unreachable".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(email.clone());
        }
        Ok(())
    }
}

/// Creates a test college.
pub async fn create_test_college(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::college::Model> {
    college::create_college(
        db,
        NewCollege {
            name: name.to_string(),
            code: None,
            address: None,
        },
    )
    .await
}

/// Creates a test course with no duration.
pub async fn create_test_course(
    db: &DatabaseConnection,
    college_id: Uuid,
    name: &str,
) -> Result<entities::course::Model> {
    course::create_course(
        db,
        NewCourse {
            name: name.to_string(),
            college_id,
            duration_years: None,
        },
    )
    .await
}

/// Creates an academic year running from June 1st 2024 to May 31st 2025.
pub async fn create_test_academic_year(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::academic_year::Model> {
    academic_year::create_academic_year(
        db,
        NewAcademicYear {
            name: name.to_string(),
            start_date: date(2024, 6, 1),
            end_date: date(2025, 5, 31),
            college_id: None,
        },
    )
    .await
}

/// Creates a test phase.
pub async fn create_test_phase(
    db: &DatabaseConnection,
    academic_year_id: Uuid,
    name: &str,
) -> Result<entities::phase::Model> {
    phase::create_phase(
        db,
        NewPhase {
            name: name.to_string(),
            academic_year_id,
        },
    )
    .await
}

/// Creates an unapproved test subject.
pub async fn create_test_subject(
    db: &DatabaseConnection,
    phase_id: Uuid,
    code: &str,
    name: &str,
) -> Result<entities::subject::Model> {
    subject::create_subject(
        db,
        NewSubject {
            name: name.to_string(),
            code: code.to_string(),
            phase_id,
            course_id: None,
            is_approved: false,
        },
    )
    .await
}

/// Registers a pending student named `<first_name> Student`.
///
/// The account email is derived from the enrollment number.
pub async fn create_test_student(
    db: &DatabaseConnection,
    college_id: Uuid,
    first_name: &str,
    enrollment_number: &str,
) -> Result<entities::student_profile::Model> {
    let registration = student::register_student(
        db,
        &RecordingMailer::default(),
        &test_settings(),
        NewStudent {
            account: AccountRef {
                user_id: None,
                email: Some(format!("{}@students.test", enrollment_number.to_lowercase())),
                password: Some("student-pass".to_string()),
            },
            first_name: first_name.to_string(),
            last_name: "Student".to_string(),
            enrollment_number: enrollment_number.to_string(),
            phone: None,
            profile_image: None,
            college_id,
            branch_id: None,
            course_id: None,
            academic_year_id: None,
        },
    )
    .await?;
    Ok(registration.profile)
}

/// Registers an assistant professor named `<first_name> Teacher`.
pub async fn create_test_teacher(
    db: &DatabaseConnection,
    college_id: Uuid,
    first_name: &str,
    employee_id: &str,
) -> Result<entities::teacher_profile::Model> {
    let registration = teacher::register_teacher(
        db,
        &RecordingMailer::default(),
        &test_settings(),
        NewTeacher {
            account: AccountRef {
                user_id: None,
                email: Some(format!("{}@staff.test", employee_id.to_lowercase())),
                password: Some("teacher-pass".to_string()),
            },
            first_name: first_name.to_string(),
            last_name: "Teacher".to_string(),
            designation: "Assistant Professor".to_string(),
            employee_id: employee_id.to_string(),
            joining_date: date(2020, 1, 6),
            phone: None,
            profile_image: None,
            college_id,
        },
    )
    .await?;
    Ok(registration.profile)
}

/// Schema with one `session` group: `date` (required), `procedure`, `ward`
/// (select, default `OPD`) and `hours`.
pub fn sample_schema() -> Value {
    json!({
        "groups": [{
            "name": "session",
            "label": "Session",
            "fields": [
                { "name": "date", "label": "Date", "type": "date", "required": true },
                { "name": "procedure", "label": "Procedure", "type": "text" },
                { "name": "ward", "label": "Ward", "type": "select",
                  "options": ["OPD", "IPD", "OT"], "default": "OPD" },
                { "name": "hours", "label": "Hours", "type": "number" }
            ]
        }]
    })
}

/// Creates a template using [`sample_schema`]. A `subject_id` makes it a
/// subject template, otherwise it is general.
pub async fn create_test_template(
    db: &DatabaseConnection,
    name: &str,
    subject_id: Option<Uuid>,
) -> Result<entities::logbook_template::Model> {
    let template_type = if subject_id.is_some() {
        entities::TemplateType::Subject
    } else {
        entities::TemplateType::General
    };
    logbook_template::create_template(
        db,
        NewTemplate {
            name: name.to_string(),
            template_type,
            subject_id,
            college_id: None,
            schema: sample_schema(),
        },
    )
    .await
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
