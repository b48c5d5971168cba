use sqlx::Row;

fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();

    std::env::var("EXAMGATE_TEST_DATABASE_URL")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[tokio::test]
async fn migrations_apply_and_tables_exist() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        eprintln!("skipping: EXAMGATE_TEST_DATABASE_URL is not set");
        return Ok(());
    };

    let pool =
        sqlx::postgres::PgPoolOptions::new().max_connections(1).connect(&database_url).await?;

    sqlx::query("DROP SCHEMA IF EXISTS public CASCADE").execute(&pool).await?;
    sqlx::query("CREATE SCHEMA public").execute(&pool).await?;

    let migrations_dir =
        std::env::var("EXAMGATE_MIGRATIONS_DIR").unwrap_or_else(|_| "migrations".to_string());
    let migrator = sqlx::migrate::Migrator::new(std::path::Path::new(&migrations_dir)).await?;
    migrator.run(&pool).await?;

    let tables = [
        "users",
        "exams",
        "questions",
        "exam_assignments",
        "exam_attempts",
        "attempt_questions",
        "exam_results",
        "permissions",
        "role_permissions",
        "user_permissions",
    ];

    for table in tables {
        let row = sqlx::query("SELECT to_regclass($1)::text").bind(table).fetch_one(&pool).await?;
        let regclass: Option<String> = row.try_get(0)?;
        assert!(regclass.is_some(), "expected table {table} to exist after migrations");
    }

    Ok(())
}
