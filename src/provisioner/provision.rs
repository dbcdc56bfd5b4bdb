use crate::config::ControlPlaneConfig;
use crate::credentials::{generate_password, generate_username, synthesize_email, DEFAULT_PASSWORD_LENGTH};
use crate::provisioner::client::ControlPlane;
use crate::provisioner::error::ProvisionResult;
use crate::provisioner::types::{
    CreateServerRequest, CreateUserRequest, ProvisionRequest, ProvisionedPanel,
};
use std::sync::Arc;
use tracing::{error, info};

/// Drives the two-step provisioning sequence against the control plane.
///
/// The steps are strictly sequential: the server-creation call needs the user
/// id from the user-creation call. There is no compensation on partial
/// failure; if server creation fails the user account stays behind and the
/// orphan is logged for manual cleanup.
pub struct Provisioner {
    control_plane: Arc<dyn ControlPlane>,
    domain: String,
    email_domain: String,
}

impl Provisioner {
    pub fn new(control_plane: Arc<dyn ControlPlane>, config: &ControlPlaneConfig) -> Self {
        Self {
            control_plane,
            domain: config.base_url.trim_end_matches('/').to_string(),
            email_domain: config.email_domain.clone(),
        }
    }

    /// Creates a panel user and a server bound to it, returning the final
    /// credentials. A blank customer password is replaced with a generated
    /// one before the user account is created.
    pub async fn provision(&self, request: &ProvisionRequest) -> ProvisionResult<ProvisionedPanel> {
        let username = generate_username(&request.panel_name);
        let email = synthesize_email(&username, &self.email_domain);
        let password = request
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| generate_password(DEFAULT_PASSWORD_LENGTH));

        let user_request = CreateUserRequest {
            email,
            username: username.clone(),
            first_name: request.panel_name.clone(),
            last_name: "User".to_string(),
            password: password.clone(),
        };
        let user_id = self.control_plane.create_user(&user_request).await?;

        let server_request = CreateServerRequest::with_deployment_defaults(
            &request.panel_name,
            user_id,
            request.ram_gb,
            request.disk_gb,
            request.cpu_percent,
        );
        let server_id = match self.control_plane.create_server(&server_request).await {
            Ok(id) => id,
            Err(err) => {
                error!(
                    username = %username,
                    user_id = user_id,
                    "Server creation failed; control plane user left orphaned, needs manual cleanup"
                );
                return Err(err);
            }
        };

        info!(
            username = %username,
            server_id = %server_id,
            "Panel provisioned"
        );

        Ok(ProvisionedPanel {
            domain: self.domain.clone(),
            username,
            password,
            server_id,
        })
    }
}
