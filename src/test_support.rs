use std::sync::{Arc, OnceLock};
use std::time::Duration as StdDuration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use sqlx::PgPool;
use time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::api;
use crate::core::{
    config::Settings, policy_cache::PolicyCache, security, state::AppState,
    time::primitive_now_utc,
};
use crate::db::models::{Exam, ExamAssignment, Question, User};
use crate::db::types::{QuestionType, UserRole};
use crate::repositories;

const TEST_SECRET_KEY: &str = "test-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

/// Integration tests need a disposable Postgres; they skip politely when
/// `EXAMGATE_TEST_DATABASE_URL` is not set so the unit suite stays green on
/// machines without one.
fn test_database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("EXAMGATE_TEST_DATABASE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn set_test_env(database_url: &str) {
    std::env::set_var("EXAMGATE_ENV", "test");
    std::env::set_var("EXAMGATE_STRICT_CONFIG", "0");
    std::env::set_var("SECRET_KEY", TEST_SECRET_KEY);
    std::env::set_var("DATABASE_URL", database_url);
    std::env::set_var("PROMETHEUS_ENABLED", "0");
}

pub(crate) async fn try_test_context() -> Option<TestContext> {
    let guard = env_lock().await;

    let Some(database_url) = test_database_url() else {
        eprintln!("skipping: EXAMGATE_TEST_DATABASE_URL is not set");
        return None;
    };
    set_test_env(&database_url);

    let settings = Settings::load().expect("settings");
    let db = prepare_db(&settings).await;

    let policy_cache = PolicyCache::new(StdDuration::from_secs(
        settings.engine().policy_cache_ttl_seconds,
    ));
    let state = AppState::new(settings, db, policy_cache);
    let app = api::router::router(state.clone());

    Some(TestContext { state, app, _guard: guard })
}

async fn prepare_db(settings: &Settings) -> PgPool {
    let db = crate::db::init_pool(settings).await.expect("db pool");

    reset_public_schema(&db).await.expect("reset schema");
    ensure_schema(&db).await.expect("schema");
    db
}

async fn reset_public_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(pool).await?;
    Ok(())
}

pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let migrations_dir =
        std::env::var("EXAMGATE_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let mut migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir))
        .await
        .map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    migrator.set_ignore_missing(true);
    migrator.run(pool).await.map_err(|error| sqlx::Error::Migrate(Box::new(error)))?;
    Ok(())
}

pub(crate) async fn insert_user(
    pool: &PgPool,
    username: &str,
    full_name: &str,
    password: &str,
    role: UserRole,
) -> User {
    let hashed_password = security::hash_password(password).expect("hash password");
    let now = primitive_now_utc();

    repositories::users::create(
        pool,
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            username,
            hashed_password,
            full_name,
            role,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert user")
}

pub(crate) async fn insert_admin(pool: &PgPool, username: &str) -> User {
    insert_user(pool, username, "Admin User", "admin-pass", UserRole::Admin).await
}

pub(crate) async fn seed_manager_grants(pool: &PgPool) {
    for code in [
        ("exam:create", "Create exams", "exams"),
        ("exam:edit", "Edit exams", "exams"),
        ("exam:delete", "Delete exams", "exams"),
        ("exam:assign", "Assign exams to users", "exams"),
        ("exam:results", "View exam results", "exams"),
        ("question:create", "Create bank questions", "questions"),
        ("question:delete", "Delete bank questions", "questions"),
        ("permission:manage", "Manage role grants and user overrides", "administration"),
    ] {
        repositories::permissions::upsert_permission(
            pool,
            &Uuid::new_v4().to_string(),
            code.0,
            code.1,
            code.2,
        )
        .await
        .expect("seed permission");
    }

    for code in [
        "exam:create",
        "exam:edit",
        "exam:assign",
        "exam:results",
        "question:create",
        "question:delete",
    ] {
        repositories::permissions::ensure_role_grant(
            pool,
            &Uuid::new_v4().to_string(),
            UserRole::Manager,
            code,
        )
        .await
        .expect("seed manager grant");
    }
}

pub(crate) struct ExamSeed {
    pub(crate) title: String,
    pub(crate) question_count: i32,
    pub(crate) time_limit_minutes: i32,
    pub(crate) starts_in_minutes: i64,
    pub(crate) ends_in_minutes: i64,
    pub(crate) timezone: String,
    pub(crate) shuffle_questions: bool,
    pub(crate) shuffle_answers: bool,
    pub(crate) require_all_questions: bool,
    pub(crate) max_attempts: i32,
    pub(crate) is_active: bool,
    pub(crate) is_public: bool,
    pub(crate) category: Option<String>,
}

impl Default for ExamSeed {
    fn default() -> Self {
        Self {
            title: "Seeded exam".to_string(),
            question_count: 5,
            time_limit_minutes: 30,
            starts_in_minutes: -60,
            ends_in_minutes: 120,
            timezone: "UTC".to_string(),
            shuffle_questions: true,
            shuffle_answers: false,
            require_all_questions: false,
            max_attempts: 1,
            is_active: true,
            is_public: false,
            category: None,
        }
    }
}

pub(crate) async fn insert_exam(pool: &PgPool, created_by: &str, seed: ExamSeed) -> Exam {
    let now = primitive_now_utc();

    repositories::exams::create(
        pool,
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            title: &seed.title,
            description: None,
            question_count: seed.question_count,
            time_limit_minutes: seed.time_limit_minutes,
            start_time: now + Duration::minutes(seed.starts_in_minutes),
            end_time: now + Duration::minutes(seed.ends_in_minutes),
            timezone: &seed.timezone,
            shuffle_questions: seed.shuffle_questions,
            shuffle_answers: seed.shuffle_answers,
            require_all_questions: seed.require_all_questions,
            max_attempts: seed.max_attempts,
            is_active: seed.is_active,
            is_public: seed.is_public,
            category: seed.category.as_deref(),
            created_by,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .expect("insert exam")
}

pub(crate) async fn seed_bank(
    pool: &PgPool,
    created_by: &str,
    count: usize,
    category: Option<&str>,
) -> Vec<Question> {
    let now = primitive_now_utc();
    let mut questions = Vec::with_capacity(count);

    for index in 0..count {
        let question = repositories::questions::create(
            pool,
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                content: &format!("Seeded question {index}"),
                question_type: QuestionType::Single,
                options: serde_json::json!(["alpha", "beta", "gamma", "delta"]),
                correct_options: serde_json::json!(["A"]),
                category,
                created_by,
                created_at: now,
            },
        )
        .await
        .expect("insert question");
        questions.push(question);
    }

    questions
}

pub(crate) async fn assign_exam(
    pool: &PgPool,
    exam_id: &str,
    user_id: &str,
    assigned_by: &str,
    max_attempts: Option<i32>,
) -> ExamAssignment {
    repositories::assignments::upsert(
        pool,
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            exam_id,
            user_id,
            max_attempts,
            assigned_by,
            assigned_at: primitive_now_utc(),
        },
    )
    .await
    .expect("assign exam")
}

pub(crate) async fn insert_result(
    pool: &PgPool,
    exam_id: &str,
    student_id: Option<&str>,
    student_name: Option<&str>,
    attempt_number: i32,
) {
    repositories::results::create(
        pool,
        repositories::results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            exam_id,
            student_id,
            student_name,
            score: 80.0,
            total_questions: 5,
            correct_answers: 4,
            time_spent_seconds: 300,
            attempt_number,
            completed_at: primitive_now_utc(),
        },
    )
    .await
    .expect("insert result")
}

pub(crate) fn bearer_token(user_id: &str, settings: &Settings) -> String {
    security::create_access_token(user_id, settings, None).expect("token")
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
