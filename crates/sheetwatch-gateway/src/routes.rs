//! API route handlers for the gateway.
//!
//! Browser forms POST and get redirected back to the dashboard; scripts use
//! GET (or `Accept: application/json`) and get JSON.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, Method, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use super::dashboard;
use super::server::AppState;

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"))
}

fn control_reply(method: &Method, status: &str, message: &str) -> Response {
    if *method == Method::POST {
        Redirect::to("/").into_response()
    } else {
        Json(serde_json::json!({
            "status": status,
            "message": message,
        }))
        .into_response()
    }
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let notifications = state.scheduler.monitor().router().history().await;
    Json(serde_json::json!({
        "status": "ok",
        "service": "sheetwatch",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "monitoring": state.scheduler.is_active(),
        "notifications_sent": notifications.iter().filter(|n| n.delivered).count(),
    }))
}

/// Dashboard page.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let status = state.scheduler.status().await;
    Html(dashboard::render_index(
        &status,
        state.scheduler.polling_interval().as_secs(),
    ))
}

pub async fn start_polling(method: Method, State(state): State<Arc<AppState>>) -> Response {
    if state.scheduler.is_active() {
        let message = "Monitoring is already active";
        tracing::info!("{message}");
        return control_reply(&method, "already_running", message);
    }

    let started = state.scheduler.start().await;
    let message = if started {
        "Started monitoring spreadsheet"
    } else {
        "Failed to start monitoring"
    };
    tracing::info!("{message}");
    control_reply(&method, if started { "started" } else { "error" }, message)
}

pub async fn stop_polling(method: Method, State(state): State<Arc<AppState>>) -> Response {
    if !state.scheduler.is_active() {
        let message = "Monitoring is not active";
        tracing::info!("{message}");
        return control_reply(&method, "not_running", message);
    }

    let stopped = state.scheduler.stop().await;
    let message = if stopped {
        "Stopped monitoring spreadsheet"
    } else {
        "Failed to stop monitoring"
    };
    tracing::info!("{message}");
    control_reply(&method, if stopped { "stopped" } else { "error" }, message)
}

pub async fn status(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    if !wants_json(&headers) {
        return Redirect::to("/").into_response();
    }

    let status = state.scheduler.status().await;
    let word = if status.is_active { "active" } else { "inactive" };
    Json(serde_json::json!({
        "status": word,
        "message": format!("Monitoring is currently {word}"),
        "last_result": status.last_result,
        "last_check_time": status.last_check_time,
        "history": status.history,
    }))
    .into_response()
}

/// Force a check, then back to the dashboard.
pub async fn check_now(State(state): State<Arc<AppState>>) -> Redirect {
    state.scheduler.check_now().await;
    Redirect::to("/")
}

pub async fn history(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let status = state.scheduler.status().await;
    if wants_json(&headers) {
        Json(serde_json::json!({ "history": status.history })).into_response()
    } else {
        Html(dashboard::render_history(&status)).into_response()
    }
}
