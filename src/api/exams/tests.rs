use axum::http::{Method, StatusCode};
use serde_json::json;
use time::{format_description::well_known::Rfc3339, Duration, OffsetDateTime};
use tower::ServiceExt;

use crate::db::types::UserRole;
use crate::test_support::{self, ExamSeed};

fn exam_payload() -> serde_json::Value {
    let now = OffsetDateTime::now_utc().replace_nanosecond(0).expect("nanoseconds");
    let start_time = (now - Duration::hours(1)).format(&Rfc3339).unwrap();
    let end_time = (now + Duration::hours(2)).format(&Rfc3339).unwrap();

    json!({
        "title": "Onboarding assessment",
        "description": "Quarterly onboarding check",
        "question_count": 5,
        "time_limit_minutes": 30,
        "start_time": start_time,
        "end_time": end_time,
        "timezone": "UTC",
        "shuffle_questions": true,
        "shuffle_answers": false,
        "require_all_questions": false,
        "max_attempts": 2,
        "is_public": false
    })
}

#[tokio::test]
async fn manager_can_create_and_list_exams() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let manager = test_support::insert_user(
        ctx.state.db(),
        "manager101",
        "Manager One",
        "manager-pass",
        UserRole::Manager,
    )
    .await;
    let token = test_support::bearer_token(&manager.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam");

    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    let exam_id = created["id"].as_str().expect("exam id").to_string();
    assert_eq!(created["max_attempts"], 2);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/exams", Some(&token), None))
        .await
        .expect("list exams");

    let status = response.status();
    let list = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {list}");
    let items = list["items"].as_array().expect("exam list");
    assert!(items.iter().any(|item| item["id"] == exam_id.as_str()));
}

#[tokio::test]
async fn student_cannot_create_exams() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let student = test_support::insert_user(
        ctx.state.db(),
        "student101",
        "Student One",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deny_override_blocks_a_role_granted_action() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin101").await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let manager = test_support::insert_user(
        ctx.state.db(),
        "manager102",
        "Manager Two",
        "manager-pass",
        UserRole::Manager,
    )
    .await;
    let manager_token = test_support::bearer_token(&manager.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/permissions/users/{}", manager.id),
            Some(&admin_token),
            Some(json!({
                "permission_code": "exam:create",
                "override_type": "deny",
                "reason": "incident follow-up"
            })),
        ))
        .await
        .expect("write deny override");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&manager_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam under deny");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn grant_override_allows_an_ungranted_action() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin102").await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student = test_support::insert_user(
        ctx.state.db(),
        "student102",
        "Student Two",
        "student-pass",
        UserRole::Student,
    )
    .await;
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/permissions/users/{}", student.id),
            Some(&admin_token),
            Some(json!({
                "permission_code": "exam:create",
                "override_type": "grant"
            })),
        ))
        .await
        .expect("write grant override");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&student_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam under grant");
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn role_grant_edit_takes_effect_immediately() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let admin = test_support::insert_admin(ctx.state.db(), "admin103").await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let manager = test_support::insert_user(
        ctx.state.db(),
        "manager103",
        "Manager Three",
        "manager-pass",
        UserRole::Manager,
    )
    .await;
    let manager_token = test_support::bearer_token(&manager.id, ctx.state.settings());

    // Warm the policy cache with the seeded grants.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&manager_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam before revoke");
    assert_eq!(response.status(), StatusCode::CREATED);

    // Replacing the role's grant set invalidates the cached policy, so the
    // next check must not be served the stale grants.
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            "/api/v1/permissions/roles/manager",
            Some(&admin_token),
            Some(json!({ "codes": [] })),
        ))
        .await
        .expect("revoke role grants");
    assert_eq!(response.status(), StatusCode::OK);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/exams",
            Some(&manager_token),
            Some(exam_payload()),
        ))
        .await
        .expect("create exam after revoke");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn managers_cannot_edit_exams_they_do_not_own() {
    let Some(ctx) = test_support::try_test_context().await else { return };

    test_support::seed_manager_grants(ctx.state.db()).await;
    let owner = test_support::insert_user(
        ctx.state.db(),
        "manager104",
        "Owner Manager",
        "manager-pass",
        UserRole::Manager,
    )
    .await;
    let outsider = test_support::insert_user(
        ctx.state.db(),
        "manager105",
        "Outsider Manager",
        "manager-pass",
        UserRole::Manager,
    )
    .await;
    let exam =
        test_support::insert_exam(ctx.state.db(), &owner.id, ExamSeed::default()).await;
    let outsider_token = test_support::bearer_token(&outsider.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PUT,
            &format!("/api/v1/exams/{}", exam.id),
            Some(&outsider_token),
            Some(json!({ "title": "Hijacked" })),
        ))
        .await
        .expect("outsider edit");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
