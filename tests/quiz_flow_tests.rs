// tests/quiz_flow_tests.rs
//
// End-to-end content and scoring flows: admin builds the
// subject -> chapter -> quiz -> question tree, users take quizzes.

use quizmaster::config::Config;
use quizmaster::routes;
use quizmaster::services::access::PolicyTable;
use quizmaster::services::identity;
use quizmaster::state::AppState;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

async fn spawn_app() -> (String, SqlitePool) {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse in-memory connection string")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory SQLite database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
        authz: Arc::new(PolicyTable::new()),
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

fn unique_email() -> String {
    format!("u_{}@example.com", &uuid::Uuid::new_v4().to_string()[..8])
}

/// Seeds the admin account and logs it in.
async fn admin_token(address: &str, pool: &SqlitePool, client: &reqwest::Client) -> String {
    let email = unique_email();
    identity::seed_admin(pool, &email, "adminpass123")
        .await
        .expect("Failed to seed admin");

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "adminpass123" }))
        .send()
        .await
        .expect("Admin login failed")
        .json()
        .await
        .unwrap();

    login["token"].as_str().expect("Token not found").to_string()
}

/// Registers a fresh user and logs it in. Returns (email, token).
async fn user_token(address: &str, client: &reqwest::Client) -> (String, String) {
    let email = unique_email();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Register failed");

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&serde_json::json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .unwrap();

    let token = login["token"].as_str().expect("Token not found").to_string();
    (email, token)
}

async fn post_created(
    client: &reqwest::Client,
    url: String,
    token: &str,
    body: serde_json::Value,
) -> serde_json::Value {
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {}", token))
        .json(&body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

/// Builds Subject "Math" -> Chapter "Algebra" -> Quiz with three
/// questions whose correct options are 0, 1 and 2.
/// Returns (subject_id, quiz_id).
async fn seed_math_quiz(
    address: &str,
    client: &reqwest::Client,
    admin_token: &str,
) -> (i64, i64) {
    let subject = post_created(
        client,
        format!("{}/api/admin/subjects", address),
        admin_token,
        serde_json::json!({ "name": "Math", "description": "Mathematics" }),
    )
    .await;
    let subject_id = subject["id"].as_i64().unwrap();

    let chapter = post_created(
        client,
        format!("{}/api/admin/chapters", address),
        admin_token,
        serde_json::json!({ "subject_id": subject_id, "name": "Algebra" }),
    )
    .await;
    let chapter_id = chapter["id"].as_i64().unwrap();

    let quiz = post_created(
        client,
        format!("{}/api/admin/quizzes", address),
        admin_token,
        serde_json::json!({
            "chapter_id": chapter_id,
            "date_of_quiz": "2026-01-15",
            "duration_minutes": 30,
            "remarks": "Quiz1"
        }),
    )
    .await;
    let quiz_id = quiz["id"].as_i64().unwrap();

    for (i, correct) in [0, 1, 2].iter().enumerate() {
        post_created(
            client,
            format!("{}/api/admin/questions", address),
            admin_token,
            serde_json::json!({
                "quiz_id": quiz_id,
                "statement": format!("Question {}", i + 1),
                "options": ["A", "B", "C", "D"],
                "correct_option": correct
            }),
        )
        .await;
    }

    (subject_id, quiz_id)
}

async fn submit_answers(
    address: &str,
    client: &reqwest::Client,
    token: &str,
    quiz_id: i64,
    answers: &HashMap<i64, i64>,
) -> reqwest::Response {
    client
        .post(format!("{}/api/quizzes/{}/submit", address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": answers }))
        .send()
        .await
        .expect("Submit failed")
}

/// Fetches the quiz paper and returns its question ids in order.
async fn paper_question_ids(
    address: &str,
    client: &reqwest::Client,
    quiz_id: i64,
) -> Vec<i64> {
    let paper: serde_json::Value = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .expect("Fetch paper failed")
        .json()
        .await
        .unwrap();

    let questions = paper["questions"].as_array().expect("Questions missing");
    questions
        .iter()
        .map(|q| {
            // The answer key must never be served to takers.
            assert!(q.get("correct_option").is_none());
            q["id"].as_i64().unwrap()
        })
        .collect()
}

#[tokio::test]
async fn partial_credit_flow() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (_subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;

    let (email, token) = user_token(&address, &client).await;
    let ids = paper_question_ids(&address, &client, quiz_id).await;
    assert_eq!(ids.len(), 3);

    // Correct answers are [0, 1, 2]; answer [correct, wrong, correct].
    let answers: HashMap<i64, i64> =
        HashMap::from([(ids[0], 0), (ids[1], 3), (ids[2], 2)]);

    let response = submit_answers(&address, &client, &token, quiz_id, &answers).await;
    assert_eq!(response.status().as_u16(), 200);

    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report["total_scored"], 2);
    assert_eq!(report["out_of"], 3);

    // One attempt per user and quiz.
    let retry = submit_answers(&address, &client, &token, quiz_id, &answers).await;
    assert_eq!(retry.status().as_u16(), 409);

    // The attempt shows up in the user's history with quiz context.
    let mine: serde_json::Value = client
        .get(format!("{}/api/scores/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 1);
    assert_eq!(mine[0]["subject_name"], "Math");
    assert_eq!(mine[0]["chapter_name"], "Algebra");
    assert_eq!(mine[0]["total_scored"], 2);

    // And on the quiz leaderboard.
    let board: serde_json::Value = client
        .get(format!("{}/api/quizzes/{}/leaderboard", address, quiz_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board[0]["email"], email);
    assert_eq!(board[0]["total_scored"], 2);
}

#[tokio::test]
async fn full_marks_and_zero_marks() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (_subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;
    let ids = paper_question_ids(&address, &client, quiz_id).await;

    let (_email, ace_token) = user_token(&address, &client).await;
    let all_correct: HashMap<i64, i64> =
        HashMap::from([(ids[0], 0), (ids[1], 1), (ids[2], 2)]);
    let report: serde_json::Value = submit_answers(&address, &client, &ace_token, quiz_id, &all_correct)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_scored"], 3);

    let (_email, zero_token) = user_token(&address, &client).await;
    let all_wrong: HashMap<i64, i64> =
        HashMap::from([(ids[0], 3), (ids[1], 0), (ids[2], 0)]);
    let report: serde_json::Value = submit_answers(&address, &client, &zero_token, quiz_id, &all_wrong)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_scored"], 0);
}

#[tokio::test]
async fn malformed_answer_sets_rejected() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (_subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;
    let ids = paper_question_ids(&address, &client, quiz_id).await;
    let (_email, token) = user_token(&address, &client).await;

    // Too few answers.
    let incomplete: HashMap<i64, i64> = HashMap::from([(ids[0], 0)]);
    let response = submit_answers(&address, &client, &token, quiz_id, &incomplete).await;
    assert_eq!(response.status().as_u16(), 400);

    // Right count, but one answer names a question of another quiz.
    let foreign: HashMap<i64, i64> =
        HashMap::from([(ids[0], 0), (ids[1], 1), (99999, 2)]);
    let response = submit_answers(&address, &client, &token, quiz_id, &foreign).await;
    assert_eq!(response.status().as_u16(), 400);

    // Option index out of range.
    let out_of_range: HashMap<i64, i64> =
        HashMap::from([(ids[0], 0), (ids[1], 1), (ids[2], 4)]);
    let response = submit_answers(&address, &client, &token, quiz_id, &out_of_range).await;
    assert_eq!(response.status().as_u16(), 400);

    // Nothing got recorded along the way.
    let mine: serde_json::Value = client
        .get(format!("{}/api/scores/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn submit_requires_authentication() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (_subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;

    let response = client
        .post(format!("{}/api/quizzes/{}/submit", address, quiz_id))
        .json(&serde_json::json!({ "answers": {} }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn regular_user_cannot_manage_content() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_email, token) = user_token(&address, &client).await;

    let response = client
        .post(format!("{}/api/admin/subjects", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "name": "Sneaky", "description": "" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .get(format!("{}/api/admin/users", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn create_chapter_requires_existing_subject() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;

    let response = client
        .post(format!("{}/api/admin/chapters", address))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&serde_json::json!({ "subject_id": 424242, "name": "Orphan" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_subject_blocks_then_cascades() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;

    // Record a score so the cascade has something at every level.
    let (_email, token) = user_token(&address, &client).await;
    let ids = paper_question_ids(&address, &client, quiz_id).await;
    let answers: HashMap<i64, i64> = HashMap::from([(ids[0], 0), (ids[1], 1), (ids[2], 2)]);
    submit_answers(&address, &client, &token, quiz_id, &answers).await;

    // Without cascade the deletion is refused and nothing changes.
    let blocked = client
        .delete(format!("{}/api/admin/subjects/{}", address, subject_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(blocked.status().as_u16(), 409);

    let still_there = client
        .get(format!("{}/api/subjects/{}", address, subject_id))
        .send()
        .await
        .unwrap();
    assert_eq!(still_there.status().as_u16(), 200);

    // With cascade the whole tree goes.
    let cascaded = client
        .delete(format!(
            "{}/api/admin/subjects/{}?cascade=true",
            address, subject_id
        ))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();
    assert_eq!(cascaded.status().as_u16(), 204);

    let subject_gone = client
        .get(format!("{}/api/subjects/{}", address, subject_id))
        .send()
        .await
        .unwrap();
    assert_eq!(subject_gone.status().as_u16(), 404);

    let quiz_gone = client
        .get(format!("{}/api/quizzes/{}", address, quiz_id))
        .send()
        .await
        .unwrap();
    assert_eq!(quiz_gone.status().as_u16(), 404);

    // The user's score went with the quiz.
    let mine: serde_json::Value = client
        .get(format!("{}/api/scores/mine", address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(mine.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn question_deletion_blocked_once_scores_exist() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let admin = admin_token(&address, &pool, &client).await;
    let (_subject_id, quiz_id) = seed_math_quiz(&address, &client, &admin).await;
    let ids = paper_question_ids(&address, &client, quiz_id).await;

    let (_email, token) = user_token(&address, &client).await;
    let answers: HashMap<i64, i64> = HashMap::from([(ids[0], 0), (ids[1], 1), (ids[2], 2)]);
    submit_answers(&address, &client, &token, quiz_id, &answers).await;

    let response = client
        .delete(format!("{}/api/admin/questions/{}", address, ids[0]))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 409);
}
