//! Public health check.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::config::Configuration;

pub const HEALTHY: &str = "healthy";

/// Service status.
#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub name: String,
    pub version: String,
}

/// Report the service is up.
pub async fn health(State(config): State<Arc<Configuration>>) -> Json<Health> {
    Json(Health {
        status: HEALTHY.into(),
        name: config.name.clone(),
        version: config.version().into(),
    })
}
