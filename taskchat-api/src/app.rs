/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskchat_api::{app::{build_router, AppState}, config::Settings};
/// use taskchat_shared::llm::{OpenAiClient, OpenAiConfig};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let settings = Settings::from_env()?;
/// let pool = PgPool::connect(settings.effective_database_url()).await?;
/// let model = OpenAiClient::new(OpenAiConfig {
///     api_key: settings.openai_api_key.clone(),
///     model: settings.openai_model.clone(),
///     base_url: settings.openai_base_url.clone(),
/// })?;
/// let state = AppState::new(pool, settings, Arc::new(model))?;
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Settings;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskchat_shared::{
    auth::{jwt::TokenIssuer, middleware::authenticate},
    llm::ChatModel,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    pub settings: Arc<Settings>,

    /// Signs and validates access tokens
    pub tokens: TokenIssuer,

    /// Model used by the chat endpoint
    pub chat_model: Arc<dyn ChatModel>,
}

impl AppState {
    /// Creates new application state
    ///
    /// Fails if the token algorithm in `settings` is unusable.
    pub fn new(
        db: PgPool,
        settings: Settings,
        chat_model: Arc<dyn ChatModel>,
    ) -> anyhow::Result<Self> {
        let tokens = TokenIssuer::new(
            &settings.secret_key,
            settings.token_algorithm()?,
            settings.token_lifetime(),
        );

        Ok(Self {
            db,
            settings: Arc::new(settings),
            tokens,
            chat_model,
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /                                    # Welcome message (public)
/// /health                              # Health check (public)
/// {api_v1_str}/
/// ├── /auth/register, /auth/login      # public
/// ├── /auth/me                         # GET, PATCH, DELETE
/// ├── /tasks                           # POST, GET
/// │   ├── /:id                         # GET, PATCH, DELETE
/// │   └── /:id/complete                # POST
/// ├── /threads                         # POST, GET
/// │   ├── /:id                         # GET, PATCH, DELETE
/// │   ├── /:id/messages                # GET, POST
/// │   └── /:id/messages/:message_id    # PATCH, DELETE
/// └── /chat                            # POST
/// ```
///
/// Everything under the prefix except register and login goes through
/// the JWT layer.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let public_routes = Router::new()
        .route("/", get(routes::root::root))
        .route("/health", get(routes::health::health_check));

    let auth_public_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login));

    let auth_me_routes = Router::new().route(
        "/me",
        get(routes::auth::me)
            .patch(routes::auth::update_me)
            .delete(routes::auth::delete_me),
    );

    let task_routes = Router::new()
        .route(
            "/",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/complete", post(routes::tasks::complete_task));

    let thread_routes = Router::new()
        .route(
            "/",
            post(routes::threads::create_thread).get(routes::threads::list_threads),
        )
        .route(
            "/:id",
            get(routes::threads::get_thread)
                .patch(routes::threads::update_thread)
                .delete(routes::threads::delete_thread),
        )
        .route(
            "/:id/messages",
            get(routes::threads::list_messages).post(routes::threads::create_message),
        )
        .route(
            "/:id/messages/:message_id",
            patch(routes::threads::update_message).delete(routes::threads::delete_message),
        );

    let protected_routes = Router::new()
        .nest("/auth", auth_me_routes)
        .nest("/tasks", task_routes)
        .nest("/threads", thread_routes)
        .route("/chat", post(routes::chat::chat))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_public_routes)
        .merge(protected_routes);

    Router::new()
        .merge(public_routes)
        .nest(&state.settings.api_v1_str, v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.settings))
        .with_state(state)
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins = settings.cors_origin_list();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// JWT authentication middleware layer
///
/// Validates the bearer token and injects `AuthContext` into request
/// extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_context = authenticate(&state.tokens, req.headers())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
