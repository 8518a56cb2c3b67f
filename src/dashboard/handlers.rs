//! Dashboard API handlers

use super::service::{build_world_panel, WorldPanel};
use super::worlds::{worlds_of, DATA_CENTERS};
use super::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Items returned per search at most
const ITEM_SEARCH_LIMIT: usize = 50;

/// Embedded dashboard page
pub async fn index() -> Html<&'static str> {
    Html(include_str!("index.html"))
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Item search query
#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    #[serde(default)]
    pub q: String,
}

/// One item search hit
#[derive(Debug, Serialize)]
pub struct ItemEntry {
    pub name: String,
    pub id: u32,
}

/// Search the catalog by name substring
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemQuery>,
) -> Json<Vec<ItemEntry>> {
    let items: Vec<ItemEntry> = state
        .catalog
        .search(&query.q)
        .take(ITEM_SEARCH_LIMIT)
        .map(|(name, id)| ItemEntry {
            name: name.to_string(),
            id,
        })
        .collect();
    Json(items)
}

/// One data center with its worlds
#[derive(Debug, Serialize)]
pub struct DataCenterEntry {
    pub name: &'static str,
    pub worlds: &'static [&'static str],
}

/// List the offered data centers
pub async fn list_datacenters() -> Json<Vec<DataCenterEntry>> {
    let centers = DATA_CENTERS
        .iter()
        .map(|dc| DataCenterEntry {
            name: dc.name,
            worlds: dc.worlds,
        })
        .collect();
    Json(centers)
}

/// History, stats, and prediction for one (world, item) pair
pub async fn world_history(
    State(state): State<AppState>,
    Path((world, item_id)): Path<(String, u32)>,
) -> Json<WorldPanel> {
    Json(build_world_panel(&state, &world, item_id).await)
}

/// Panels for every world of one data center, fetched concurrently
pub async fn datacenter_lookup(
    State(state): State<AppState>,
    Path((data_center, item_id)): Path<(String, u32)>,
) -> Result<Json<Vec<WorldPanel>>, (StatusCode, Json<Value>)> {
    let Some(worlds) = worlds_of(&data_center) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown data center: {}", data_center) })),
        ));
    };

    let panels = join_all(
        worlds
            .iter()
            .map(|world| build_world_panel(&state, world, item_id)),
    )
    .await;

    Ok(Json(panels))
}
