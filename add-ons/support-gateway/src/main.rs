//! Axum-based support gateway: chat API, status, and the chat widget. Config-driven via CoreConfig.

mod handlers;

use axum::extract::State;
use axum::http::Method;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use support_core::{
    CoreConfig, FallbackSettings, KnowledgeBase, LlmProvider, ProviderFactory, SimilarityIndex,
    SupportAgent, SIMILARITY_THRESHOLD, SUGGESTED_PROMPTS,
};
use support_skills::ModelRouter;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeFile;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Built-in entries unless `knowledge_base_path` names a JSON file.
fn load_knowledge(config: &CoreConfig) -> Result<KnowledgeBase, String> {
    match config.knowledge_base_path.as_deref() {
        Some(path) => KnowledgeBase::from_json_path(path).map_err(|e| e.to_string()),
        None => Ok(KnowledgeBase::builtin()),
    }
}

fn provider_factory(config: &CoreConfig) -> ProviderFactory {
    let api_url = config.api_url.clone();
    Box::new(move || {
        let router = ModelRouter::from_env()?.with_base_url(api_url.clone());
        Ok(Arc::new(router) as Arc<dyn LlmProvider>)
    })
}

/// Pre-flight check: config loads, knowledge base parses, index fits, port is free.
fn run_verify() -> Result<(), String> {
    let config = CoreConfig::load().map_err(|e| format!("Config load failed: {}", e))?;

    print!("Checking knowledge base... ");
    let knowledge = load_knowledge(&config)?;
    println!("OK ({} entries)", knowledge.len());

    print!("Fitting similarity index... ");
    let index = SimilarityIndex::fit(knowledge.questions());
    println!("OK ({} terms)", index.vocabulary_size());

    let port = config.port;
    print!("Checking port {}... ", port);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    match std::net::TcpListener::bind(addr) {
        Ok(listener) => {
            drop(listener);
            println!("OK (available)");
        }
        Err(e) => {
            return Err(format!("Port {} BLOCKED: {}", port, e));
        }
    }

    println!("\nSUCCESS: Ready to start gateway.");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[support-gateway] .env not loaded: {} (using system environment)", e);
    }

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--verify") {
        match run_verify() {
            Ok(()) => std::process::exit(0),
            Err(e) => {
                eprintln!("PRE-FLIGHT FAILED: {}", e);
                std::process::exit(1);
            }
        }
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match CoreConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("[support-gateway] config load failed: {}", e);
            std::process::exit(1);
        }
    };
    let knowledge = match load_knowledge(&config) {
        Ok(kb) => kb,
        Err(e) => {
            eprintln!("[support-gateway] knowledge base load failed: {}", e);
            std::process::exit(1);
        }
    };

    let agent = Arc::new(SupportAgent::new(
        knowledge,
        FallbackSettings::from_config(&config),
        provider_factory(&config),
    ));
    agent.warm_up();
    tracing::info!(
        entries = agent.knowledge().len(),
        llm_live = agent.client_live(),
        "Support agent ready"
    );

    let app = build_app(AppState {
        config: Arc::clone(&config),
        agent,
    });

    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("[support-gateway] bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    tracing::info!("{} listening on {}", config.app_name, addr);
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server stopped");
    }
}

fn frontend_root_dir() -> std::path::PathBuf {
    // Prefer a working-directory relative path (run from the crate dir), else the manifest dir.
    let cwd = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let from_cwd = cwd.join("static");
    if from_cwd.join("index.html").exists() {
        return from_cwd;
    }
    std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static")
}

fn build_app(state: AppState) -> Router {
    let frontend_enabled = state.config.frontend_enabled;

    // CORS: allow Backend/API (8001-8099) and Frontend/UI (3001-3099) port ranges.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &axum::http::HeaderValue, _| {
            let s = origin.to_str().unwrap_or("");
            let port = s
                .rsplit(':')
                .next()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(0);
            (3001..=3099).contains(&port) || (8001..=8099).contains(&port)
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    let mut app = Router::new()
        .route("/v1/status", get(status))
        .route("/api/v1/health", get(health))
        .route("/api/v1/chat", post(handlers::chat::chat))
        .with_state(state);

    if frontend_enabled {
        app = app.route_service("/", ServeFile::new(frontend_root_dir().join("index.html")));
    }

    app.layer(cors)
}

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) config: Arc<CoreConfig>,
    pub(crate) agent: Arc<SupportAgent>,
}

/// GET /api/v1/health – liveness check for UI and scripts.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

/// GET /v1/status – app identity and matcher settings for the widget.
async fn status(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "app_name": state.config.app_name,
        "port": state.config.port,
        "model": state.agent.settings().model,
        "knowledge_entries": state.agent.knowledge().len(),
        "similarity_threshold": SIMILARITY_THRESHOLD,
        "suggested_prompts": SUGGESTED_PROMPTS,
        "llm_live": state.agent.client_live(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use support_core::{CompletionRequest, LlmError, STATIC_FALLBACK_MESSAGE};
    use tower::ServiceExt;

    struct FailingProvider;

    #[async_trait::async_trait]
    impl LlmProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
            Err(LlmError::Provider {
                status: 500,
                body: "boom".to_string(),
            })
        }
    }

    fn test_config() -> CoreConfig {
        CoreConfig {
            app_name: "Test Gateway".to_string(),
            port: 8001,
            frontend_enabled: false,
            ..CoreConfig::default()
        }
    }

    fn test_app() -> Router {
        build_app(AppState {
            config: Arc::new(test_config()),
            agent: Arc::new(SupportAgent::offline(KnowledgeBase::builtin())),
        })
    }

    async fn post_chat(app: Router, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_returns_ok() {
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_reports_identity_and_prompts() {
        let req = Request::builder()
            .uri("/v1/status")
            .body(Body::empty())
            .unwrap();
        let res = test_app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["app_name"], "Test Gateway");
        assert_eq!(json["knowledge_entries"], 5);
        assert_eq!(json["suggested_prompts"][0], "What does EVA do?");
        assert_eq!(json["llm_live"], false);
    }

    #[tokio::test]
    async fn test_chat_answers_from_knowledge_base() {
        let (status, json) =
            post_chat(test_app(), serde_json::json!({ "message": "What does EVA do?" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["source"], "knowledge_base");
        assert!(json["response"].as_str().unwrap().starts_with("EVA"));
        assert!(json["score"].as_f64().unwrap() >= 0.35);
    }

    #[tokio::test]
    async fn test_chat_empty_message_prompts_for_question() {
        let (status, json) = post_chat(
            test_app(),
            serde_json::json!({ "message": "   ", "history": [] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "prompt");
        assert!(json["score"].is_null());
        assert!(json["response"].as_str().unwrap().contains("Please"));
    }

    #[tokio::test]
    async fn test_chat_without_client_uses_static_fallback() {
        let (status, json) = post_chat(
            test_app(),
            serde_json::json!({
                "message": "What is the capital of France?",
                "history": [
                    { "role": "user", "content": "Hi" },
                    { "role": "assistant", "content": "Hello!" }
                ]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["source"], "static_fallback");
        assert_eq!(json["response"], STATIC_FALLBACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_chat_provider_error_returns_bad_gateway_when_not_degrading() {
        let settings = FallbackSettings {
            degrade_on_provider_error: false,
            ..FallbackSettings::default()
        };
        let agent = SupportAgent::new(
            KnowledgeBase::builtin(),
            settings,
            Box::new(|| Ok(Arc::new(FailingProvider) as Arc<dyn LlmProvider>)),
        );
        let app = build_app(AppState {
            config: Arc::new(test_config()),
            agent: Arc::new(agent),
        });
        let (status, json) =
            post_chat(app, serde_json::json!({ "message": "How do I make pasta?" })).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["status"], "error");
        assert!(json["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_root_serves_widget_when_frontend_enabled() {
        let config = CoreConfig {
            frontend_enabled: true,
            ..test_config()
        };
        let app = build_app(AppState {
            config: Arc::new(config),
            agent: Arc::new(SupportAgent::offline(KnowledgeBase::builtin())),
        });
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8_lossy(&bytes);
        assert!(html.contains("Thoughtful AI Support"));
    }

    #[test]
    fn provider_factory_requires_api_key() {
        // Only meaningful when the key is absent from the test environment.
        if std::env::var("ANTHROPIC_API_KEY").is_ok() {
            return;
        }
        let factory = provider_factory(&test_config());
        assert!(matches!(factory(), Err(LlmError::MissingApiKey(_))));
    }
}
