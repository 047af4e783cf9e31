#[macro_use]
extern crate tracing;

mod app_config;
mod args;
mod credentials;
mod endpoints;

pub use app_config::{
    get_config_dir,
    get_data_dir,
    AppConfig,
};
pub use args::{
    Args,
    Command,
    CredentialArgs,
    OutputFormat,
};
pub use credentials::{
    is_uuid_length,
    EnvironmentCredentials,
    SubscriptionCredentials,
};
pub use endpoints::ApiEndpoints;
use eyre::{
    Context as _,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(flatten, skip_serializing)]
    pub app_config: AppConfig,
    pub endpoints: ApiEndpoints,
    pub page_size: u32,
    pub request_timeout: String,
    pub staff_email_domain: String,
    pub excluded_role_codename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<SubscriptionCredentials>,
    #[serde(default)]
    pub environments: Vec<EnvironmentCredentials>,
}

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

impl Default for Config {
    fn default() -> Self {
        serde_yml::from_str(DEFAULT_CONFIG).expect("Failed to parse default config")
    }
}

impl Config {
    /// Layers the embedded defaults, the stored `config.yaml`, an explicit config file, a credentials file and the
    /// command-line credentials, in increasing precedence.
    pub fn new(args: &Args) -> Result<Self, config::ConfigError> {
        let config_dir = get_config_dir();
        let mut builder = config::Config::builder()
            .set_default("config_dir", config_dir.to_string_lossy().to_string())?
            .set_default("data_dir", get_data_dir().to_string_lossy().to_string())?
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml));

        builder = builder.add_source(
            config::File::from(config_dir.join("config.yaml"))
                .format(config::FileFormat::Yaml)
                .required(false),
        );

        for path in [&args.config, &args.credentials.credentials].into_iter().flatten() {
            debug!(?path, "Adding configuration file");
            builder = builder.add_source(config::File::from(path.as_path()).format(config::FileFormat::Yaml));
        }

        builder = builder.add_source(args.credentials.clone());

        let cfg: Self = builder.build()?.try_deserialize()?;

        Ok(cfg)
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.app_config.data_dir
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.request_timeout)
            .wrap_err_with(|| format!("Invalid request timeout '{}'", self.request_timeout))
    }

    /// The configured environments, each completed with the subscription credentials if it has none of its own.
    pub fn environment_credentials(&self) -> Vec<EnvironmentCredentials> {
        self.environments
            .iter()
            .cloned()
            .map(|creds| creds.with_subscription_fallback(self.subscription.as_ref()))
            .collect()
    }

    /// All validation errors of the configured credentials, empty if the run can start.
    pub fn validate_credentials(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .environment_credentials()
            .iter()
            .enumerate()
            .flat_map(|(index, creds)| creds.validate(index + 1))
            .collect();
        if let Some(subscription) = &self.subscription {
            errors.extend(subscription.validate());
        }
        errors
    }
}
