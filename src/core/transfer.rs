//! CSV import/export and printable reports.
//!
//! The CSV dialect is the common spreadsheet one: comma separated, fields
//! optionally wrapped in double quotes, a doubled quote inside a quoted field
//! standing for one quote character. The printable report is self-contained
//! HTML meant for the browser's print-to-PDF.

use crate::{
    config::Settings,
    core::{
        ensure_exists, ensure_exists_opt,
        logbook_entry::{EntryFilter, list_entries},
        student::{NewStudent, get_student, register_student},
        user::AccountRef,
    },
    entities::{
        AcademicYear, Branch, College, Course, LogBookTemplate, logbook_entry, logbook_template,
        student_profile,
    },
    errors::{Error, Result},
    notify::Mailer,
    template::TemplateSchema,
};
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt::Write as _;
use tracing::{info, instrument, warn};

/// Splits CSV text into records, keeping line breaks that sit inside quoted
/// fields. Each record comes with the 1-based line it starts on.
#[must_use]
pub fn split_csv_records(text: &str) -> Vec<(usize, String)> {
    let mut records = Vec::new();
    let mut buf = String::new();
    let mut start = 1;
    let mut line = 1;
    let mut in_quotes = false;
    for ch in text.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                buf.push(ch);
            }
            '\n' if !in_quotes => {
                let record = std::mem::take(&mut buf);
                records.push((start, record.trim_end_matches('\r').to_string()));
                line += 1;
                start = line;
            }
            '\n' => {
                line += 1;
                buf.push(ch);
            }
            _ => buf.push(ch),
        }
    }
    if !buf.is_empty() {
        records.push((start, buf.trim_end_matches('\r').to_string()));
    }
    records
}

/// Splits one CSV record into fields.
#[must_use]
pub fn parse_csv_record(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                buf.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => out.push(std::mem::take(&mut buf)),
            _ => buf.push(ch),
        }
    }
    out.push(buf);
    out
}

/// Quotes a value for CSV output when it needs it.
#[must_use]
pub fn csv_quote(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_quote(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// One student row of a roster file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    /// 1-based line number in the file
    pub line: usize,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Enrollment (roll) number
    pub enrollment_number: String,
    /// Login email
    pub email: String,
    /// Contact number
    pub phone: Option<String>,
}

/// Parsed roster: usable rows plus warnings for the skipped ones.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Rows with every mandatory value present
    pub rows: Vec<RosterRow>,
    /// One message per skipped line
    pub warnings: Vec<String>,
}

struct RosterColumns {
    first_name: usize,
    last_name: usize,
    enrollment_number: usize,
    email: usize,
    phone: Option<usize>,
}

impl RosterColumns {
    fn from_header(header: &[String]) -> Result<Self> {
        let find = |names: &[&str]| {
            header.iter().position(|h| {
                let h = h.trim().to_ascii_lowercase();
                names.iter().any(|n| *n == h)
            })
        };
        let first_name = find(&["first_name", "first"]);
        let last_name = find(&["last_name", "last"]);
        let enrollment_number = find(&["enrollment_number", "roll_no"]);
        let email = find(&["email"]);

        let mut missing = Vec::new();
        for (name, idx) in [
            ("first_name", first_name),
            ("last_name", last_name),
            ("enrollment_number", enrollment_number),
            ("email", email),
        ] {
            if idx.is_none() {
                missing.push(name);
            }
        }
        match (first_name, last_name, enrollment_number, email) {
            (Some(first_name), Some(last_name), Some(enrollment_number), Some(email)) => Ok(Self {
                first_name,
                last_name,
                enrollment_number,
                email,
                phone: find(&["phone"]),
            }),
            _ => Err(Error::Validation {
                message: "Roster header is missing required columns".to_string(),
                details: json!({ "missingColumns": missing }),
            }),
        }
    }
}

/// Parses a roster CSV. The first non-blank line is the header; header names
/// are matched case-insensitively.
pub fn parse_roster(text: &str) -> Result<Roster> {
    let mut records = split_csv_records(text)
        .into_iter()
        .filter(|(_, r)| !r.trim().is_empty());

    let Some((_, header)) = records.next() else {
        return Err(Error::validation("Roster file is empty"));
    };
    let columns = RosterColumns::from_header(&parse_csv_record(&header))?;

    let mut roster = Roster::default();
    for (line, text) in records {
        let record = parse_csv_record(&text);
        let cell = |idx: usize| {
            record
                .get(idx)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let row = RosterRow {
            line,
            first_name: cell(columns.first_name),
            last_name: cell(columns.last_name),
            enrollment_number: cell(columns.enrollment_number),
            email: cell(columns.email),
            phone: columns
                .phone
                .map(cell)
                .filter(|p| !p.is_empty()),
        };

        let mut missing = Vec::new();
        if row.first_name.is_empty() && row.last_name.is_empty() {
            missing.push("name");
        }
        if row.enrollment_number.is_empty() {
            missing.push("enrollment number");
        }
        if row.email.is_empty() {
            missing.push("email");
        }
        if missing.is_empty() {
            roster.rows.push(row);
        } else {
            roster
                .warnings
                .push(format!("line {line}: missing {}", missing.join(", ")));
        }
    }
    Ok(roster)
}

/// Body of a roster import.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterImport {
    /// College every imported student joins
    pub college_id: Uuid,
    /// Branch placement for every row
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    /// Course placement for every row
    #[serde(default)]
    pub course_id: Option<Uuid>,
    /// Academic year placement for every row
    #[serde(default)]
    pub academic_year_id: Option<Uuid>,
    /// CSV text
    pub csv: String,
}

/// Outcome of a roster import.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Students registered
    pub created: usize,
    /// Lines not imported
    pub skipped: usize,
    /// Why each skipped line was skipped
    pub warnings: Vec<String>,
    /// Welcome emails that could not be delivered
    pub email_failures: usize,
}

/// Registers one student per valid roster row.
///
/// The college and placement ids shared by every row are checked first and
/// fail the whole import. After that a row that cannot be registered becomes
/// a warning and the import moves on, so the report always accounts for the
/// rows already committed.
#[instrument(skip(db, mailer, settings, request), fields(college_id = %request.college_id))]
pub async fn import_students(
    db: &DatabaseConnection,
    mailer: &dyn Mailer,
    settings: &Settings,
    request: RosterImport,
) -> Result<ImportReport> {
    let roster = parse_roster(&request.csv)?;
    ensure_exists::<College, _>(db, "college", request.college_id).await?;
    ensure_exists_opt::<Branch, _>(db, "branch", request.branch_id).await?;
    ensure_exists_opt::<Course, _>(db, "course", request.course_id).await?;
    ensure_exists_opt::<AcademicYear, _>(db, "academic year", request.academic_year_id).await?;

    let mut report = ImportReport {
        skipped: roster.warnings.len(),
        warnings: roster.warnings,
        ..Default::default()
    };

    for row in roster.rows {
        let line = row.line;
        let input = NewStudent {
            account: AccountRef {
                user_id: None,
                email: Some(row.email),
                password: None,
            },
            first_name: row.first_name,
            last_name: row.last_name,
            enrollment_number: row.enrollment_number,
            phone: row.phone,
            profile_image: None,
            college_id: request.college_id,
            branch_id: request.branch_id,
            course_id: request.course_id,
            academic_year_id: request.academic_year_id,
        };
        match register_student(db, mailer, settings, input).await {
            Ok(registration) => {
                report.created += 1;
                if registration.email_error.is_some() {
                    report.email_failures += 1;
                }
            }
            Err(e) => report.skip(line, &e),
        }
    }

    if report.skipped > 0 {
        warn!(skipped = report.skipped, "Roster import skipped lines");
    }
    info!(created = report.created, "Roster import finished");
    Ok(report)
}

impl ImportReport {
    fn skip(&mut self, line: usize, err: &Error) {
        self.skipped += 1;
        let reason = match err {
            Error::Validation { message, details } => format!("{message} {details}"),
            Error::Conflict { message } => message.clone(),
            other => {
                warn!(line, error = %other, "Roster row failed");
                format!("not imported: {other}")
            }
        };
        self.warnings.push(format!("line {line}: {reason}"));
    }
}

async fn templates_for(
    db: &DatabaseConnection,
    entries: &[logbook_entry::Model],
) -> Result<HashMap<Uuid, logbook_template::Model>> {
    let mut ids: Vec<Uuid> = entries.iter().map(|e| e.template_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let templates = LogBookTemplate::find()
        .filter(logbook_template::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(templates.into_iter().map(|t| (t.id, t)).collect())
}

fn schema_for(template: Option<&logbook_template::Model>) -> Option<TemplateSchema> {
    template.and_then(|t| TemplateSchema::from_json(&t.schema).ok())
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders matching entries as CSV.
///
/// Fixed columns come first, then one column per field name in the order the
/// fields were first seen across the entries' templates. Keys stored before a
/// template edit removed their field still get a column.
#[instrument(skip(db))]
pub async fn export_entries_csv(db: &DatabaseConnection, filter: &EntryFilter) -> Result<String> {
    let entries = list_entries(db, filter).await?;
    let templates = templates_for(db, &entries).await?;

    let mut columns: Vec<String> = Vec::new();
    for entry in &entries {
        let mut names: Vec<String> = schema_for(templates.get(&entry.template_id))
            .map(|schema| schema.field_names().iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        if let Some(data) = entry.data.as_object() {
            names.extend(data.keys().cloned());
        }
        for name in names {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
    }

    let mut header: Vec<String> = [
        "entryId",
        "templateName",
        "createdAt",
        "studentRemarks",
        "teacherRemarks",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    header.extend(columns.iter().cloned());

    let mut out = csv_line(&header);
    out.push('\n');
    for entry in &entries {
        let mut row = vec![
            entry.id.to_string(),
            templates
                .get(&entry.template_id)
                .map(|t| t.name.clone())
                .unwrap_or_default(),
            entry.created_at.to_rfc3339(),
            entry.student_remarks.clone().unwrap_or_default(),
            entry.teacher_remarks.clone().unwrap_or_default(),
        ];
        row.extend(
            columns
                .iter()
                .map(|c| entry.data.get(c).map(display_value).unwrap_or_default()),
        );
        out.push_str(&csv_line(&row));
        out.push('\n');
    }
    info!(rows = entries.len(), "Entries exported");
    Ok(out)
}

/// Escapes text for inclusion in HTML.
#[must_use]
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_entry(
    out: &mut String,
    entry: &logbook_entry::Model,
    template: Option<&logbook_template::Model>,
) -> std::fmt::Result {
    let title = template.map_or("Untitled template", |t| t.name.as_str());
    writeln!(out, "<section class=\"entry\">")?;
    writeln!(
        out,
        "<h2>{}</h2><p class=\"meta\">{}</p>",
        html_escape(title),
        entry.created_at.format("%Y-%m-%d %H:%M UTC")
    )?;

    let schema = schema_for(template);
    let mut shown: Vec<&str> = Vec::new();
    if let Some(schema) = &schema {
        for group in &schema.groups {
            let heading = group.label.as_deref().unwrap_or(&group.name);
            writeln!(out, "<h3>{}</h3><table>", html_escape(heading))?;
            for field in &group.fields {
                let label = if field.label.is_empty() {
                    &field.name
                } else {
                    &field.label
                };
                let value = entry
                    .data
                    .get(&field.name)
                    .map(display_value)
                    .unwrap_or_default();
                writeln!(
                    out,
                    "<tr><th>{}</th><td>{}</td></tr>",
                    html_escape(label),
                    html_escape(&value)
                )?;
                shown.push(field.name.as_str());
            }
            writeln!(out, "</table>")?;
        }
    }

    if let Some(data) = entry.data.as_object() {
        let extra: Vec<(&String, &Value)> = data
            .iter()
            .filter(|(k, _)| !shown.contains(&k.as_str()))
            .collect();
        if !extra.is_empty() {
            writeln!(out, "<h3>Other</h3><table>")?;
            for (key, value) in extra {
                writeln!(
                    out,
                    "<tr><th>{}</th><td>{}</td></tr>",
                    html_escape(key),
                    html_escape(&display_value(value))
                )?;
            }
            writeln!(out, "</table>")?;
        }
    }

    for (label, remarks) in [
        ("Student remarks", &entry.student_remarks),
        ("Teacher remarks", &entry.teacher_remarks),
    ] {
        if let Some(text) = remarks {
            writeln!(
                out,
                "<p><strong>{label}:</strong> {}</p>",
                html_escape(text)
            )?;
        }
    }
    writeln!(out, "</section>")
}

/// Renders every entry of a student as a printable HTML page.
#[instrument(skip(db))]
pub async fn render_print_report(db: &DatabaseConnection, student_id: Uuid) -> Result<String> {
    let student = get_student(db, student_id).await?;
    let entries = list_entries(
        db,
        &EntryFilter {
            student_id: Some(student_id),
            ..Default::default()
        },
    )
    .await?;
    let templates = templates_for(db, &entries).await?;

    let mut out = String::new();
    render_report(&mut out, &student, &entries, &templates)
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    Ok(out)
}

fn render_report(
    out: &mut String,
    student: &student_profile::Model,
    entries: &[logbook_entry::Model],
    templates: &HashMap<Uuid, logbook_template::Model>,
) -> std::fmt::Result {
    let name = html_escape(&format!("{} {}", student.first_name, student.last_name));
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(
        out,
        "<html><head><meta charset=\"utf-8\"><title>Log book - {name}</title>"
    )?;
    writeln!(
        out,
        "<style>body{{font-family:sans-serif}}table{{border-collapse:collapse;width:100%}}\
         th,td{{border:1px solid #999;padding:4px;text-align:left}}\
         section{{page-break-inside:avoid;margin-bottom:24px}}</style></head><body>"
    )?;
    writeln!(
        out,
        "<h1>{name}</h1><p>Enrollment number: {}</p>",
        html_escape(&student.enrollment_number)
    )?;
    if entries.is_empty() {
        writeln!(out, "<p>No log-book entries.</p>")?;
    }
    for entry in entries {
        render_entry(out, entry, templates.get(&entry.template_id))?;
    }
    writeln!(out, "</body></html>")
}
