// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, auth, catalog, scores},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, catalog, scores, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects the application state (pool, config, authorization policy).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new().route("/me", get(auth::get_me)).layer(
                middleware::from_fn_with_state(state.clone(), auth_middleware),
            ),
        );

    let subject_routes = Router::new()
        .route("/", get(catalog::list_subjects))
        .route("/{id}", get(catalog::get_subject))
        .route("/{id}/chapters", get(catalog::list_chapters));

    let chapter_routes = Router::new().route("/{id}/quizzes", get(catalog::list_quizzes));

    let quiz_routes = Router::new()
        .route("/{id}", get(catalog::get_quiz_paper))
        .route("/{id}/leaderboard", get(scores::leaderboard))
        // Protected quiz routes
        .merge(
            Router::new()
                .route("/{id}/submit", post(scores::submit))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let score_routes = Router::new().route("/mine", get(scores::my_scores)).layer(
        middleware::from_fn_with_state(state.clone(), auth_middleware),
    );

    // Token check happens here; each handler then asks the policy table
    // for the specific action.
    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", delete(admin::delete_user))
        .route("/users/{id}/deactivate", post(admin::deactivate_user))
        .route("/users/{id}/reactivate", post(admin::reactivate_user))
        .route("/users/{id}/roles", put(admin::assign_roles))
        .route("/roles", get(admin::list_roles))
        .route("/subjects", post(admin::create_subject))
        .route(
            "/subjects/{id}",
            put(admin::update_subject).delete(admin::delete_subject),
        )
        .route("/chapters", post(admin::create_chapter))
        .route(
            "/chapters/{id}",
            put(admin::update_chapter).delete(admin::delete_chapter),
        )
        .route("/quizzes", post(admin::create_quiz))
        .route(
            "/quizzes/{id}",
            put(admin::update_quiz).delete(admin::delete_quiz),
        )
        .route("/questions", post(admin::create_question))
        .route(
            "/questions/{id}",
            put(admin::update_question).delete(admin::delete_question),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/subjects", subject_routes)
        .nest("/api/chapters", chapter_routes)
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/scores", score_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
