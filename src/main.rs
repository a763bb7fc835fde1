use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod handlers;
mod models;
mod services;
mod templates;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(origin) => Some(origin),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

pub fn build_router(state: AppState) -> Router {
    // Credential submissions are rate limited per IP and path
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .route(
            "/accounts/login/",
            get(handlers::accounts::login_form).post(handlers::accounts::login_submit),
        )
        .route(
            "/accounts/register/",
            get(handlers::accounts::register_form).post(handlers::accounts::register_submit),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/logout", get(handlers::accounts::logout))
        .merge(auth_routes);

    let page_routes = Router::new()
        .route("/", get(handlers::pages::index))
        .route("/save-mood/", post(handlers::pages::save_mood))
        .route("/save-note/", post(handlers::pages::save_note))
        .route("/graph/", get(handlers::pages::graph))
        .route("/settings/", get(handlers::pages::settings))
        .route("/save-settings/", post(handlers::pages::save_settings))
        .route("/search/", get(handlers::pages::search))
        .route("/calendar/", get(handlers::pages::calendar))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_login,
        ));

    let api_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Entries & notes
        .route("/api/entry-day/", post(handlers::entries::save_entry_day))
        .route("/api/save-note/", post(handlers::entries::save_note))
        .route("/api/mood-table/", get(handlers::entries::mood_table))
        .route("/api/standout-data/", get(handlers::entries::standout_data))
        .route("/api/search/", get(handlers::entries::search))
        .route("/api/calendar/", get(handlers::entries::calendar))
        .route("/api/export/", get(handlers::entries::export))
        // Charts
        .route("/api/graph/", get(handlers::graphs::graph))
        .route("/api/scatter-graph/", get(handlers::graphs::scatter_graph))
        .route("/api/pie-chart-graph/", get(handlers::graphs::pie_chart_graph))
        .route("/api/bar-chart-graph/", get(handlers::graphs::bar_chart_graph))
        // Settings
        .route("/api/settings/", get(handlers::settings::get_settings))
        .route("/api/set-language/", post(handlers::settings::set_language))
        .route(
            "/api/forms-displayed/",
            get(handlers::settings::get_forms_displayed).post(handlers::settings::set_forms_displayed),
        )
        .route(
            "/api/mood-colors/",
            get(handlers::settings::get_mood_colors).post(handlers::settings::set_mood_colors),
        )
        .route("/api/i18n/", get(handlers::settings::translations))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodcal_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let db = db::create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations applied");

    let rate_limiter = RateLimitState::new();
    rate_limiter.spawn_cleanup_worker();

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter,
    };
    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!(
        registration_open = config.registration_open,
        "Starting server on {}",
        addr
    );

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    // Client IP is needed by the auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::auth::jwt::create_access_token;
    use crate::config::AUTH_COOKIE;

    fn test_app() -> (Router, Arc<Config>) {
        let config = Arc::new(Config::for_tests());
        let state = AppState {
            db: db::lazy_pool(&config.database_url),
            config: config.clone(),
            rate_limiter: RateLimitState::new(),
        };
        (build_router(state), config)
    }

    fn with_client_ip(mut req: Request<Body>) -> Request<Body> {
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        req
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = test_app();
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_api_requires_token() {
        let (app, _) = test_app();
        let res = app
            .oneshot(Request::get("/api/mood-table/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_page_redirects_to_login() {
        let (app, _) = test_app();
        let res = app
            .oneshot(Request::get("/graph/?start_dt=2021-11-01").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(res.status().is_redirection());
        let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap();
        assert!(location.starts_with("/accounts/login/?next="));
        assert!(location.contains("%2Fgraph%2F"));
    }

    #[tokio::test]
    async fn test_save_mood_rejects_malformed_entry() {
        let (app, config) = test_app();
        let token = create_access_token(Uuid::new_v4(), "anna", &config).unwrap();

        let req = Request::post("/save-mood/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, format!("{}={}", AUTH_COOKIE, token))
            .body(Body::from("entry=7_2021-11-08&period=mood_day"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_form_renders() {
        let (app, _) = test_app();
        let req = with_client_ip(
            Request::get("/accounts/login/?next=/search/")
                .body(Body::empty())
                .unwrap(),
        );
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = res.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn test_register_closed_is_not_found() {
        let (app, _) = test_app();
        let req = with_client_ip(Request::get("/accounts/register/").body(Body::empty()).unwrap());
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
