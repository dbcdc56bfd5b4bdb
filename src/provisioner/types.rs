use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed deployment parameters for every provisioned server. These mirror the
/// control plane's configured Minecraft application template.
pub const EGG_ID: u32 = 15;
pub const LOCATION_ID: u32 = 1;
pub const DOCKER_IMAGE: &str = "ghcr.io/pterodactyl/yolks:java_17";
pub const STARTUP_COMMAND: &str = "java -Xms128M -Xmx{{SERVER_MEMORY}}M -jar {{SERVER_JARFILE}}";

/// Validated input for the two-step provisioning sequence.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub panel_name: String,
    /// Customer-supplied password. Blank or absent means one is generated.
    pub password: Option<String>,
    pub whatsapp_number: String,
    pub ram_gb: u32,
    pub disk_gb: u32,
    pub cpu_percent: u32,
}

/// Credentials and identifiers returned to the customer after both
/// control-plane calls succeed. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedPanel {
    pub domain: String,
    pub username: String,
    pub password: String,
    pub server_id: String,
}

/// Body for the control plane's user-creation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerLimits {
    pub memory: u32,
    pub swap: u32,
    pub disk: u32,
    pub io: u32,
    pub cpu: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureLimits {
    pub databases: u32,
    pub backups: u32,
    pub allocations: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllocationSpec {
    pub default: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploySpec {
    pub locations: Vec<u32>,
    pub dedicated_ip: bool,
    pub port_range: Vec<String>,
}

/// Body for the control plane's server-creation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub name: String,
    pub user: u64,
    pub egg: u32,
    pub docker_image: String,
    pub startup: String,
    pub environment: BTreeMap<String, String>,
    pub limits: ServerLimits,
    pub feature_limits: FeatureLimits,
    pub allocation: AllocationSpec,
    pub deploy: DeploySpec,
}

impl CreateServerRequest {
    /// Builds a server-creation body from package resources, applying the
    /// fixed template parameters. RAM and disk arrive in GB and the control
    /// plane expects MB; CPU is already a percentage.
    pub fn with_deployment_defaults(
        name: &str,
        user_id: u64,
        ram_gb: u32,
        disk_gb: u32,
        cpu_percent: u32,
    ) -> Self {
        let mut environment = BTreeMap::new();
        environment.insert("SERVER_JARFILE".to_string(), "server.jar".to_string());
        environment.insert("BUILD_NUMBER".to_string(), "latest".to_string());

        Self {
            name: name.to_string(),
            user: user_id,
            egg: EGG_ID,
            docker_image: DOCKER_IMAGE.to_string(),
            startup: STARTUP_COMMAND.to_string(),
            environment,
            limits: ServerLimits {
                memory: ram_gb * 1024,
                swap: 0,
                disk: disk_gb * 1024,
                io: 500,
                cpu: cpu_percent,
            },
            feature_limits: FeatureLimits {
                databases: 1,
                backups: 1,
                allocations: 1,
            },
            allocation: AllocationSpec { default: 1 },
            deploy: DeploySpec {
                locations: vec![LOCATION_ID],
                dedicated_ip: false,
                port_range: Vec::new(),
            },
        }
    }
}

/// Response envelopes from the control plane. Only the identifiers the
/// pipeline relays onward are deserialized.
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    pub attributes: UserAttributes,
}

#[derive(Debug, Deserialize)]
pub struct UserAttributes {
    pub id: u64,
}

#[derive(Debug, Deserialize)]
pub struct ServerResponse {
    pub attributes: ServerAttributes,
}

#[derive(Debug, Deserialize)]
pub struct ServerAttributes {
    pub identifier: String,
}
