use axum::http::HeaderValue;
use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod database;
mod error;
mod handlers;
mod integrations;
mod middleware;
mod services;
mod tenancy;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, AUTH_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = crate::config::config();
    tracing::info!("Starting Pulse CRM API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("PULSE_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("Pulse CRM API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");

    crate::database::manager::DatabaseManager::close().await;
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Internal admin surface (fronted by the private network / gateway)
        .merge(admin_routes())
        // Tenant self-service surface, session required
        .merge(marketing_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn public_routes() -> Router {
    use axum::routing::post;
    use handlers::{auth_callback, billing, leads};

    Router::new()
        // Sign-in code exchange (browser redirect target)
        .route("/auth/callback", get(auth_callback::callback))
        // Payment provider webhook: authenticated by signature, not session
        .route("/api/marketing/billing/webhook", post(billing::webhook))
        // Contact-form intake from the public site
        .route("/api/leads", get(leads::list).post(leads::create))
}

fn admin_routes() -> Router {
    use axum::routing::post;
    use handlers::{blog, clients, customers, graph, seo};

    Router::new()
        // Blog content
        .route("/api/blog", get(blog::list).post(blog::create))
        .route(
            "/api/blog/:slug",
            get(blog::get).patch(blog::update).delete(blog::remove),
        )
        .route("/api/blog/:slug/toggle", post(blog::toggle))
        // Per-page SEO overrides
        .route("/api/seo", get(seo::list).put(seo::upsert))
        .route("/api/seo/lookup", get(seo::lookup))
        .route("/api/seo/:id", axum::routing::delete(seo::remove))
        // Customers and lead promotion
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/:id",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::remove),
        )
        .route("/api/customers/promote", post(customers::promote))
        // Tenant roster
        .route("/api/clients", get(clients::list))
        .route("/api/clients/:id", axum::routing::patch(clients::update))
        // Graph queries (optional backend)
        .route("/api/graph/query", post(graph::query))
}

fn marketing_routes() -> Router {
    use axum::routing::post;
    use handlers::{billing, briefings, campaigns, clients, marketing_leads, research};

    Router::new()
        // Generated prospect list
        .route("/api/marketing/leads", get(marketing_leads::list))
        .route(
            "/api/marketing/leads/:id",
            axum::routing::patch(marketing_leads::update).delete(marketing_leads::remove),
        )
        .route("/api/marketing/leads/:id/send", post(marketing_leads::send))
        // Outreach review queue
        .route("/api/briefings", get(briefings::list))
        .route("/api/briefings/bulk-send", post(briefings::bulk_send))
        .route("/api/briefings/:id/send", post(briefings::send))
        .route("/api/briefings/:id/dismiss", post(briefings::dismiss))
        // Campaigns and generated content
        .route(
            "/api/marketing/campaigns",
            get(campaigns::list).post(campaigns::create),
        )
        .route(
            "/api/marketing/campaigns/:id",
            get(campaigns::get).delete(campaigns::remove),
        )
        .route("/api/marketing/campaigns/:id/content", post(campaigns::add_content))
        .route(
            "/api/marketing/campaigns/:id/content/:content_id/approve",
            post(campaigns::set_content_approval),
        )
        .route("/api/marketing/campaigns/:id/send", post(campaigns::send_preview))
        // Research assistant
        .route("/api/companies/research/chat", post(research::chat))
        .route("/api/companies/research/ask", post(research::ask))
        // Billing self-service
        .route("/api/marketing/billing/checkout", post(billing::checkout))
        .route("/api/marketing/billing/portal", post(billing::portal))
        // Own tenant + usage
        .route("/api/marketing/tenant", get(clients::current))
        .layer(axum::middleware::from_fn(middleware::session_middleware))
}

fn cors_layer() -> CorsLayer {
    let security = &crate::config::config().security;
    if !security.enable_cors {
        return CorsLayer::new();
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Pulse CRM API",
            "version": version,
            "description": "Multi-tenant marketing/CRM administration API",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/callback (public - sign-in redirect)",
                "leads": "/api/leads (public - contact-form intake)",
                "webhook": "/api/marketing/billing/webhook (signature-verified)",
                "briefings": "/api/briefings (session required)",
                "research": "/api/companies/research/* (session required)",
                "blog": "/api/blog[/:slug] (admin)",
                "seo": "/api/seo[/:id] (admin)",
                "customers": "/api/customers[/:id] (admin)",
                "clients": "/api/clients[/:id] (admin)",
                "graph": "/api/graph/query (admin)",
                "marketing": "/api/marketing/* (session required)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
