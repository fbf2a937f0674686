//! API handlers.
//!
//! Thin adapters from HTTP to `Agent` calls; all status mapping lives in
//! `response.rs`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::http::response::{InstanceView, ServiceEntry, SystemStatus};
use crate::http::server::AppState;
use crate::registry::{Registration, RegistryError};

#[derive(Debug, Default, Deserialize)]
pub struct HealthQuery {
    #[serde(default)]
    pub tag: Option<String>,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
        instances: state.agent.instance_count(),
        watched: state.agent.watched_count(),
    })
}

pub async fn register_service(
    State(state): State<AppState>,
    payload: Result<Json<Registration>, JsonRejection>,
) -> Result<Json<InstanceView>, RegistryError> {
    let Json(registration) =
        payload.map_err(|rejection| RegistryError::InvalidRegistration(rejection.body_text()))?;
    let instance = state.agent.register(registration)?;
    Ok(Json(instance.into()))
}

pub async fn deregister_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, RegistryError> {
    state.agent.deregister(&id)?;
    Ok(Json(serde_json::json!({ "deregistered": id })))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InstanceView>, RegistryError> {
    Ok(Json(state.agent.get(&id)?.into()))
}

pub async fn list_services(State(state): State<AppState>) -> Json<Vec<InstanceView>> {
    let mut views: Vec<InstanceView> = state
        .agent
        .services()
        .into_iter()
        .map(InstanceView::from)
        .collect();
    views.sort_by(|a, b| a.id.cmp(&b.id));
    Json(views)
}

pub async fn health_service(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HealthQuery>,
) -> Result<Json<Vec<ServiceEntry>>, RegistryError> {
    let tag = query.tag.unwrap_or_default();
    let entries = state
        .agent
        .health_service(&name, &tag)?
        .into_iter()
        .map(ServiceEntry::from)
        .collect();
    Ok(Json(entries))
}
