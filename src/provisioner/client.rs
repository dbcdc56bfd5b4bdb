use crate::config::ControlPlaneConfig;
use crate::provisioner::error::{ProvisionError, ProvisionResult};
use crate::provisioner::types::{
    CreateServerRequest, CreateUserRequest, ServerResponse, UserResponse,
};
use async_trait::async_trait;
use reqwest::header;
use serde::Serialize;
use std::time::Duration;
use tracing::{error, info};

/// Seam between the provisioning flow and the remote control plane.
///
/// Both operations return only the identifier the pipeline relays onward;
/// the control plane remains authoritative for everything else.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Creates a panel user account and returns its numeric id.
    async fn create_user(&self, request: &CreateUserRequest) -> ProvisionResult<u64>;

    /// Creates a server instance and returns its short identifier.
    async fn create_server(&self, request: &CreateServerRequest) -> ProvisionResult<String>;
}

/// HTTP client for the Pterodactyl application API.
///
/// Authenticates with the application (admin) key as a bearer token. The
/// client key is held in configuration for panel-side use but the
/// provisioning sequence itself only needs the application key.
pub struct PterodactylClient {
    base_url: String,
    application_key: String,
    http: reqwest::Client,
}

impl PterodactylClient {
    pub fn new(config: &ControlPlaneConfig) -> ProvisionResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout))
            .build()
            .map_err(|e| ProvisionError::NetworkError {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            application_key: config.application_key.clone(),
            http,
        })
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> ProvisionResult<(u16, String)> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.application_key)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProvisionError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ProvisionError::NetworkError {
                message: format!("Failed to read response body: {}", e),
            })?;

        Ok((status, text))
    }
}

#[async_trait]
impl ControlPlane for PterodactylClient {
    async fn create_user(&self, request: &CreateUserRequest) -> ProvisionResult<u64> {
        info!(username = %request.username, "Creating control plane user");

        let (status, body) = self.post_json("/api/application/users", request).await?;
        if !(200..300).contains(&status) {
            error!(status = status, body = %body, "User creation error");
            return Err(ProvisionError::UserCreationFailed { status });
        }

        let response: UserResponse =
            serde_json::from_str(&body).map_err(|e| ProvisionError::InvalidResponse {
                message: format!("Failed to parse user response: {}", e),
            })?;

        info!(user_id = response.attributes.id, "Control plane user created");
        Ok(response.attributes.id)
    }

    async fn create_server(&self, request: &CreateServerRequest) -> ProvisionResult<String> {
        info!(name = %request.name, user_id = request.user, "Creating control plane server");

        let (status, body) = self.post_json("/api/application/servers", request).await?;
        if !(200..300).contains(&status) {
            error!(status = status, body = %body, "Server creation error");
            return Err(ProvisionError::ServerCreationFailed { status });
        }

        let response: ServerResponse =
            serde_json::from_str(&body).map_err(|e| ProvisionError::InvalidResponse {
                message: format!("Failed to parse server response: {}", e),
            })?;

        info!(server_id = %response.attributes.identifier, "Control plane server created");
        Ok(response.attributes.identifier)
    }
}
