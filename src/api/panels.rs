//! POST /api/create-panel: two-step provisioning endpoint
//!
//! Runs the user-then-server control-plane sequence and hands the resulting
//! credentials straight back. On success the operations chat is notified
//! through the queued notifier, so the response never waits on Telegram.

use crate::api::{attach_request_id, is_missing};
use crate::error::AppError;
use crate::middleware::error::{add_cors_headers, json_error_response};
use crate::provisioner::provision::Provisioner;
use crate::provisioner::types::ProvisionRequest;
use crate::services::notification::{
    provisioning_summary, NotificationService, ProvisioningNotice,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct PanelsState {
    pub provisioner: Arc<Provisioner>,
    pub notifications: NotificationService,
}

#[derive(Debug, Deserialize)]
pub struct CreatePanelRequest {
    #[serde(default, rename = "panelName")]
    pub panel_name: Option<String>,
    /// Optional; blank means the panel generates one.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub ram: Option<u32>,
    #[serde(default)]
    pub disk: Option<u32>,
    #[serde(default)]
    pub cpu: Option<u32>,
}

/// Provision a panel: control-plane user first, then the server.
///
/// The successful body carries the customer's credentials (`domain`,
/// `username`, `password`, `serverId`). Either upstream failure surfaces as
/// a 500 naming the step and the upstream status.
pub async fn create_panel(
    State(state): State<PanelsState>,
    headers: HeaderMap,
    Json(body): Json<CreatePanelRequest>,
) -> Response {
    let ram = body.ram.unwrap_or(0);
    let disk = body.disk.unwrap_or(0);
    let cpu = body.cpu.unwrap_or(0);
    if is_missing(&body.panel_name) || is_missing(&body.whatsapp) || ram == 0 || disk == 0 || cpu == 0
    {
        return json_error_response(StatusCode::BAD_REQUEST, "Missing required fields");
    }
    let panel_name = body.panel_name.unwrap_or_default();
    let whatsapp = body.whatsapp.unwrap_or_default();

    let request = ProvisionRequest {
        panel_name: panel_name.clone(),
        password: body.password,
        whatsapp_number: whatsapp.clone(),
        ram_gb: ram,
        disk_gb: disk,
        cpu_percent: cpu,
    };

    match state.provisioner.provision(&request).await {
        Ok(panel) => {
            info!(
                username = %panel.username,
                server_id = %panel.server_id,
                "panel provisioned"
            );
            state
                .notifications
                .notify(provisioning_summary(&ProvisioningNotice {
                    panel_name,
                    username: panel.username.clone(),
                    ram_gb: ram,
                    disk_gb: disk,
                    cpu_percent: cpu,
                    whatsapp_number: whatsapp,
                    server_id: panel.server_id.clone(),
                }));

            let mut resp_headers = HeaderMap::new();
            add_cors_headers(&mut resp_headers);
            (StatusCode::OK, resp_headers, Json(panel)).into_response()
        }
        Err(e) => attach_request_id(AppError::from(e), &headers).into_response(),
    }
}
