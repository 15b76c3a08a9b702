// tests/stats_tests.rs

use coursehub::{config::Config, routes, state::AppState, utils::jwt::sign_jwt};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const JWT_SECRET: &str = "stats_test_secret";

async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_username: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn user_with_role(pool: &SqlitePool, role: &str) -> (i64, String) {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (username, password, role) VALUES (?1, 'x', ?2) RETURNING id",
    )
    .bind(format!("{}_{}", role, &uuid::Uuid::new_v4().to_string()[..8]))
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap();

    let token = sign_jwt(id, role, JWT_SECRET, 600).unwrap();
    (id, token)
}

/// Seeds a course with `module_count` modules directly in the database.
async fn seed_course(pool: &SqlitePool, module_count: usize) -> (i64, Vec<i64>) {
    let course_id: i64 =
        sqlx::query_scalar("INSERT INTO courses (title) VALUES ('Course') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();

    let mut module_ids = Vec::new();
    for i in 0..module_count {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO modules (course_id, title, position) VALUES (?1, 'Module', ?2) RETURNING id",
        )
        .bind(course_id)
        .bind(i as i64)
        .fetch_one(pool)
        .await
        .unwrap();
        module_ids.push(id);
    }

    (course_id, module_ids)
}

async fn fetch_stats(client: &reqwest::Client, address: &str, token: &str) -> serde_json::Value {
    let response = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    response.json().await.unwrap()
}

#[tokio::test]
async fn stats_are_all_zero_on_an_empty_platform() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, admin) = user_with_role(&pool, "admin").await;

    let stats = fetch_stats(&client, &address, &admin).await;

    assert_eq!(stats["totalStudents"], 0);
    assert_eq!(stats["totalAdmins"], 1);
    assert_eq!(stats["totalCourses"], 0);
    assert_eq!(stats["totalEnrollments"], 0);
    assert_eq!(stats["engagementRate"], 0);
}

#[tokio::test]
async fn engagement_rate_averages_completion_percentages() {
    // One enrollment at 50% completion.
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, admin) = user_with_role(&pool, "admin").await;
    let (_, student) = user_with_role(&pool, "student").await;
    let (course_id, module_ids) = seed_course(&pool, 2).await;

    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/api/modules/{}/complete", address, module_ids[0]))
        .bearer_auth(&student)
        .json(&serde_json::json!({"courseId": course_id}))
        .send()
        .await
        .unwrap();

    let stats = fetch_stats(&client, &address, &admin).await;

    assert_eq!(stats["totalStudents"], 1);
    assert_eq!(stats["totalAdmins"], 1);
    assert_eq!(stats["totalCourses"], 1);
    assert_eq!(stats["totalEnrollments"], 1);
    assert_eq!(stats["engagementRate"], 50);

    // A second, untouched enrollment drags the average to 25.
    let (_, other_student) = user_with_role(&pool, "student").await;
    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&other_student)
        .send()
        .await
        .unwrap();

    let stats = fetch_stats(&client, &address, &admin).await;
    assert_eq!(stats["totalEnrollments"], 2);
    assert_eq!(stats["engagementRate"], 25);
}

#[tokio::test]
async fn enrollment_in_an_empty_course_counts_as_zero_percent() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, admin) = user_with_role(&pool, "admin").await;
    let (_, student) = user_with_role(&pool, "student").await;
    let (course_id, _) = seed_course(&pool, 0).await;

    client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();

    let stats = fetch_stats(&client, &address, &admin).await;
    assert_eq!(stats["totalEnrollments"], 1);
    assert_eq!(stats["engagementRate"], 0);
}

#[tokio::test]
async fn stats_require_the_admin_role() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, student) = user_with_role(&pool, "student").await;

    let response = client
        .get(format!("{}/api/admin/stats", address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/api/admin/stats", address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}
