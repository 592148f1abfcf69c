#![allow(clippy::unwrap_used)]
use super::*;
use crate::{errors::Result, test_utils::*};
use axum::{
    body::{Body, to_bytes},
    http::{Method, Request},
};
use serde_json::Value;
use tower::ServiceExt;

async fn app() -> Result<(Router, DatabaseConnection)> {
    let db = setup_test_db().await?;
    let state = AppState::new(db.clone(), test_settings(), Arc::new(RecordingMailer::default()));
    Ok((router(state), db))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (app, _db) = app().await?;
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_invalid_create_is_400_and_inserts_nothing() -> Result<()> {
    let (app, _db) = app().await?;

    let (status, body) = call(&app, Method::POST, "/api/colleges", Some(json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert!(body["error"]["details"]["name"].is_string());

    let (status, body) = call(&app, Method::POST, "/api/colleges", Some(json!({ "code": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");

    let (_, list) = call(&app, Method::GET, "/api/colleges", None).await;
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_every_group_rejects_missing_required_field() -> Result<()> {
    let (app, _db) = app().await?;
    let some_id = Uuid::new_v4();

    // Each body leaves out exactly one required field
    let cases = [
        ("/api/colleges", json!({ "code": "RMC" })),
        ("/api/courses", json!({ "name": "MBBS" })),
        ("/api/branches", json!({ "name": "General Surgery" })),
        (
            "/api/academic-years",
            json!({ "name": "2024-2025", "startDate": "2024-06-01" }),
        ),
        ("/api/phases", json!({ "name": "Phase I" })),
        ("/api/subjects", json!({ "name": "Anatomy", "phaseId": some_id })),
        ("/api/modules", json!({ "name": "Upper limb" })),
        ("/api/users", json!({ "name": "Asha Rao", "role": "ADMIN" })),
        (
            "/api/students",
            json!({
                "email": "asha@college.edu",
                "firstName": "Asha",
                "lastName": "Rao",
                "collegeId": some_id
            }),
        ),
        (
            "/api/teachers",
            json!({
                "email": "meera@college.edu",
                "firstName": "Meera",
                "lastName": "Iyer",
                "designation": "Professor",
                "joiningDate": "2019-07-01",
                "collegeId": some_id
            }),
        ),
        (
            "/api/teacher-subjects",
            json!({ "teacherId": some_id, "academicYearId": some_id, "phaseId": some_id }),
        ),
        ("/api/student-subjects", json!({ "studentId": some_id })),
        (
            "/api/logbook-templates",
            json!({ "templateType": "general", "schema": sample_schema() }),
        ),
        ("/api/logbook-entries", json!({ "studentId": some_id, "data": {} })),
    ];

    for (path, body) in cases {
        let (status, error) = call(&app, Method::POST, path, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "POST {path}");
        assert_eq!(error["error"]["code"], "VALIDATION_FAILED", "POST {path}");

        let (status, list) = call(&app, Method::GET, path, None).await;
        assert_eq!(status, StatusCode::OK, "GET {path}");
        assert_eq!(list, json!([]), "GET {path}");
    }
    Ok(())
}

#[tokio::test]
async fn test_update_unknown_id_is_404() -> Result<()> {
    let (app, _db) = app().await?;
    let uri = format!("/api/colleges/{}", Uuid::new_v4());
    let (status, body) = call(&app, Method::PUT, &uri, Some(json!({ "name": "Renamed" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (_, list) = call(&app, Method::GET, "/api/colleges", None).await;
    assert_eq!(list, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_delete_twice_and_query_id() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Riverside Medical College").await?;

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/colleges?id={}", college.id),
        Some(json!({ "code": "RMC" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "RMC");
    assert_eq!(body["name"], "Riverside Medical College");

    let uri = format!("/api/colleges/{}", college.id);
    let (status, body) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["id"], college.id.to_string());

    let (status, _) = call(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::DELETE, "/api/colleges?id=not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_academic_year_round_trip_accepts_rfc3339() -> Result<()> {
    let (app, _db) = app().await?;

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/academic-years",
        Some(json!({
            "name": "2024-2025",
            "startDate": "2024-06-01T00:00:00.000Z",
            "endDate": "2025-05-31"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let uri = format!("/api/academic-years/{}", created["id"].as_str().unwrap());
    let (status, fetched) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["startDate"], "2024-06-01");
    assert_eq!(fetched["endDate"], "2025-05-31");

    let (status, _) = call(
        &app,
        Method::PATCH,
        &uri,
        Some(json!({ "endDate": "2024-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_teacher_subject_reassignment_replaces_tuple() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Hillview College").await?;
    let year = create_test_academic_year(&db, "2024-2025").await?;
    let phase = create_test_phase(&db, year.id, "Phase I").await?;
    let anatomy = create_test_subject(&db, phase.id, "ANAT101", "Anatomy").await?;
    let physiology = create_test_subject(&db, phase.id, "PHYS101", "Physiology").await?;
    let biochem = create_test_subject(&db, phase.id, "BIOC101", "Biochemistry").await?;

    let (status, teacher) = call(
        &app,
        Method::POST,
        "/api/teachers",
        Some(json!({
            "email": "meera@hillview.edu",
            "firstName": "Meera",
            "lastName": "Iyer",
            "designation": "Professor",
            "employeeId": "EMP-001",
            "joiningDate": "2019-07-01",
            "collegeId": college.id
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(teacher["user"]["role"], "TEACHER");
    let teacher_id = teacher["id"].as_str().unwrap().to_string();

    let assign = |subjects: Vec<Uuid>| {
        json!({
            "teacherId": teacher_id,
            "academicYearId": year.id,
            "phaseId": phase.id,
            "subjectIds": subjects
        })
    };
    let (status, rows) = call(
        &app,
        Method::POST,
        "/api/teacher-subjects",
        Some(assign(vec![anatomy.id, physiology.id])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/teacher-subjects",
        Some(assign(vec![physiology.id, biochem.id, biochem.id])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = call(
        &app,
        Method::GET,
        &format!("/api/teacher-subjects?teacherId={teacher_id}"),
        None,
    )
    .await;
    let mut subjects: Vec<String> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["subjectId"].as_str().unwrap().to_string())
        .collect();
    subjects.sort();
    let mut expected = vec![physiology.id.to_string(), biochem.id.to_string()];
    expected.sort();
    assert_eq!(subjects, expected);
    Ok(())
}

#[tokio::test]
async fn test_entry_with_undeclared_field_is_rejected() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Lakeside College").await?;
    let student = create_test_student(&db, college.id, "Arjun", "MBBS-001").await?;

    let (status, template) = call(
        &app,
        Method::POST,
        "/api/logbook-templates",
        Some(json!({
            "name": "Clinical posting",
            "templateType": "general",
            "schema": sample_schema()
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/logbook-entries",
        Some(json!({
            "templateId": template["id"],
            "studentId": student.id,
            "data": { "procedure": "Suturing", "bed": 4 }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["details"]["unknownFields"], json!(["bed"]));

    let (_, entries) = call(&app, Method::GET, "/api/logbook-entries", None).await;
    assert_eq!(entries, json!([]));

    let (status, entry) = call(
        &app,
        Method::POST,
        "/api/logbook-entries",
        Some(json!({
            "templateId": template["id"],
            "studentId": student.id,
            "data": { "procedure": "Suturing", "ward": "OT" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["data"]["ward"], "OT");
    Ok(())
}

#[tokio::test]
async fn test_export_and_print_entries() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Lakeside College").await?;
    let student = create_test_student(&db, college.id, "Arjun", "MBBS-001").await?;
    let template = create_test_template(&db, "Clinical posting", None).await?;
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/logbook-entries",
        Some(json!({
            "templateId": template.id,
            "studentId": student.id,
            "data": { "procedure": "Suturing, simple", "ward": "OPD" }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let request = Request::builder()
        .uri(format!("/api/logbook-entries/export?studentId={}", student.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    let csv = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec())
        .unwrap();
    assert!(csv.contains("\"Suturing, simple\""));

    let request = Request::builder()
        .uri(format!("/api/logbook-entries/print?studentId={}", student.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec())
        .unwrap();
    assert!(html.contains("Arjun"));

    let (status, _) = call(&app, Method::GET, "/api/logbook-entries/print", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_first_login_landing_and_password_change() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Lakeside College").await?;
    let student = create_test_student(&db, college.id, "Arjun", "MBBS-002").await?;

    let uri = format!("/api/session/landing?userId={}", student.user_id);
    let (status, landing) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(landing["action"], "changePassword");
    assert_eq!(landing["next"], "/student/dashboard");

    let (status, body) = call(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/password", student.user_id),
        Some(json!({ "currentPassword": "wrong-pass", "newPassword": "a-better-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = call(
        &app,
        Method::PATCH,
        &format!("/api/users/{}/password", student.user_id),
        Some(json!({ "currentPassword": "student-pass", "newPassword": "a-better-secret" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, landing) = call(&app, Method::GET, &uri, None).await;
    assert_eq!(landing["action"], "dashboard");
    assert_eq!(landing["path"], "/student/dashboard");
    Ok(())
}

#[tokio::test]
async fn test_student_verification_transitions() -> Result<()> {
    let (app, db) = app().await?;
    let college = create_test_college(&db, "Lakeside College").await?;
    let student = create_test_student(&db, college.id, "Arjun", "MBBS-003").await?;
    let uri = format!("/api/students/{}/verification", student.id);

    let (status, body) = call(&app, Method::PATCH, &uri, Some(json!({ "status": "APPROVED" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "APPROVED");

    let (status, body) = call(&app, Method::PATCH, &uri, Some(json!({ "status": "REJECTED" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");
    Ok(())
}
