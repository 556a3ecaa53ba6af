use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use bin3d_optimizer::budget::TerminationReason;
use bin3d_optimizer::{binpack3d, BoxSpec, SolveLimits};
use serde::{Deserialize, Serialize};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Deserialize, Serialize)]
struct BoxRequest {
    w: i32,
    h: i32,
    d: i32,
}

#[derive(Deserialize, Serialize)]
struct SolveRequest {
    stock: BoxRequest,
    boxes: Vec<BoxRequest>,
    #[serde(default)]
    node_limit: Option<u64>,
    #[serde(default)]
    iter_limit: Option<u64>,
    #[serde(default)]
    time_limit_secs: Option<u64>,
}

#[derive(Serialize)]
struct PlacementResponse {
    no: usize,
    w: i32,
    h: i32,
    d: i32,
    x: i32,
    y: i32,
    z: i32,
    bno: usize,
}

#[derive(Serialize)]
struct SolveResponse {
    placements: Vec<PlacementResponse>,
    lb: i64,
    ub: usize,
    node_used: u64,
    iter_used: u64,
    time_used_ms: u128,
    termination: &'static str,
}

fn termination_label(reason: TerminationReason) -> &'static str {
    match reason {
        TerminationReason::Optimal => "OPTIMAL",
        TerminationReason::NodeLimit => "NODELIMIT",
        TerminationReason::IterLimit => "ITERLIMIT",
        TerminationReason::TimeLimit => "TIMELIMIT",
    }
}

async fn solve(Json(req): Json<SolveRequest>) -> Result<Json<SolveResponse>, (StatusCode, Json<serde_json::Value>)> {
    tracing::info!(body = serde_json::to_string(&req).unwrap_or_default(), "POST /solve");

    let boxes: Vec<BoxSpec> = req.boxes.iter().map(|b| BoxSpec { w: b.w, h: b.h, d: b.d }).collect();
    let limits = SolveLimits {
        node_limit: req.node_limit,
        iter_limit: req.iter_limit,
        time_limit: req.time_limit_secs.map(std::time::Duration::from_secs),
    };
    let (w, h, d) = (req.stock.w, req.stock.h, req.stock.d);

    let outcome = tokio::task::spawn_blocking(move || binpack3d(w, h, d, &boxes, limits))
        .await
        .expect("solver task panicked")
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": e.to_string() }))))?;

    let response = SolveResponse {
        placements: outcome
            .placements
            .iter()
            .map(|p| PlacementResponse { no: p.no, w: p.w, h: p.h, d: p.d, x: p.x, y: p.y, z: p.z, bno: p.bno })
            .collect(),
        lb: outcome.lb,
        ub: outcome.ub,
        node_used: outcome.usage.node_used,
        iter_used: outcome.usage.iter_used,
        time_used_ms: outcome.usage.time_used.as_millis(),
        termination: termination_label(outcome.termination),
    };

    Ok(Json(response))
}

#[tokio::main]
async fn main() {
    let _sentry_guard = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((dsn, sentry::ClientOptions { release: sentry::release_name!(), ..Default::default() }))
    });

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/solve", post(solve))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.unwrap();
}
