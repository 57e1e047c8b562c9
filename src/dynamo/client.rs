//! DynamoDB client construction.
//!
//! Supports multiple credential sources in order of priority:
//! 1. Hardcoded credentials (access_key, secret_key, session_token)
//! 2. AWS profile from ~/.aws/credentials
//! 3. Default credential chain (environment variables, instance profile, etc.)

use aws_config::meta::region::RegionProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::Client;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Global shared Tokio runtime for blocking calls.
pub(crate) static RUNTIME: Lazy<Arc<Runtime>> =
    Lazy::new(|| Arc::new(Runtime::new().expect("Failed to create global Tokio runtime")));

/// Fallback when neither the config nor the environment names a region.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Connection settings for DynamoDB.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct DynamoConfig {
    /// AWS region (default: AWS_REGION env var, then us-east-1)
    pub region: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Session token for temporary credentials.
    pub session_token: Option<String>,
    /// Profile name from ~/.aws/credentials.
    pub profile: Option<String>,
    /// Custom endpoint for local testing (localstack, moto, DynamoDB Local).
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for DynamoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamoConfig")
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .field("profile", &self.profile)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl DynamoConfig {
    /// Region that will be used: explicit, then environment, then the default.
    pub fn resolved_region(&self) -> String {
        self.region.clone().unwrap_or_else(|| {
            std::env::var("AWS_REGION")
                .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|_| DEFAULT_REGION.to_string())
        })
    }
}

/// Build the AWS SDK DynamoDB client with the given configuration.
pub async fn build_client(config: &DynamoConfig) -> Client {
    // Region priority: param > env var > default
    let region_provider = RegionProviderChain::first_try(
        config
            .region
            .clone()
            .map(aws_sdk_dynamodb::config::Region::new),
    )
    .or_default_provider()
    .or_else(DEFAULT_REGION);

    let mut config_loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);

    // Credentials priority: hardcoded > profile > env/default chain
    if let (Some(ak), Some(sk)) = (&config.access_key, &config.secret_key) {
        let creds = Credentials::new(
            ak,
            sk,
            config.session_token.clone(),
            None,
            "dynobatch-hardcoded",
        );
        config_loader = config_loader.credentials_provider(creds);
    } else if let Some(profile_name) = &config.profile {
        let profile_provider = ProfileFileCredentialsProvider::builder()
            .profile_name(profile_name)
            .build();
        config_loader = config_loader.credentials_provider(profile_provider);
    }

    let sdk_config = config_loader.load().await;

    let mut dynamo_config = aws_sdk_dynamodb::config::Builder::from(&sdk_config);

    if let Some(url) = &config.endpoint_url {
        dynamo_config = dynamo_config.endpoint_url(url);
    }

    Client::from_conf(dynamo_config.build())
}

/// Blocking version of [`build_client`] on the shared runtime.
pub fn connect(config: &DynamoConfig) -> Client {
    RUNTIME.block_on(build_client(config))
}
