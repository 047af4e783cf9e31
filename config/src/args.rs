use clap::{
    Parser,
    Subcommand,
    ValueEnum,
};
use std::path::PathBuf;
use strum::Display;

/// Kontent.ai Usage Insights
#[derive(Parser, Debug, Clone)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Additional configuration file (yaml), layered over the stored configuration.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true, action)]
    pub verbose: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Collect usage metrics for the configured environments.
    Collect {
        /// Discover every environment of the subscription instead of using the configured list.
        #[arg(long, action)]
        all_environments: bool,

        /// Output format of the report.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write the report to this file instead of stdout.
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Verify that the configured API keys are valid before collecting.
    Check {
        /// Print the results as JSON.
        #[arg(long, action)]
        json: bool,
    },

    /// List the projects and environments visible to the subscription key.
    Projects {
        /// Print the results as JSON.
        #[arg(long, action)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Table => "txt",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Credentials given on the command line or through the environment.
/// A given environment ID replaces the configured environment list.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct CredentialArgs {
    /// YAML file with `environments` and/or `subscription` entries.
    #[arg(long, global = true, value_name = "FILE")]
    pub credentials: Option<PathBuf>,

    /// Environment ID (UUID).
    #[arg(long, global = true, env = "KONTENT_ENVIRONMENT_ID", value_name = "UUID")]
    pub environment_id: Option<String>,

    /// Delivery API key with 'Content preview' access.
    #[arg(long, global = true, env = "KONTENT_DELIVERY_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub delivery_key: Option<String>,

    /// Management API key.
    #[arg(long, global = true, env = "KONTENT_MANAGEMENT_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub management_key: Option<String>,

    /// Subscription ID (UUID).
    #[arg(long, global = true, env = "KONTENT_SUBSCRIPTION_ID", value_name = "UUID")]
    pub subscription_id: Option<String>,

    /// Subscription API key.
    #[arg(long, global = true, env = "KONTENT_SUBSCRIPTION_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub subscription_key: Option<String>,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
        ValueKind,
    };
    use std::collections::HashMap;

    impl Source for CredentialArgs {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(environment_id) = &self.environment_id {
                let mut entry = HashMap::<String, Value>::from_iter([(
                    "environment_id".to_string(),
                    environment_id.clone().into(),
                )]);
                if let Some(key) = &self.delivery_key {
                    entry.insert("delivery_api_key".to_string(), key.clone().into());
                }
                if let Some(key) = &self.management_key {
                    entry.insert("management_api_key".to_string(), key.clone().into());
                }
                cache.insert(
                    "environments".to_string(),
                    vec![ValueKind::Table(entry)].into(),
                );
            }
            if let Some(id) = &self.subscription_id {
                cache.insert("subscription.id".to_string(), id.clone().into());
            }
            if let Some(key) = &self.subscription_key {
                cache.insert("subscription.api_key".to_string(), key.clone().into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_dir_path = crate::get_config_dir().display().to_string();
    let data_dir_path = crate::get_data_dir().display().to_string();

    format!(
        "{}

Authors: {author}

Config directory: {config_dir_path}
Data directory: {data_dir_path}",
        clap::crate_version!()
    )
}
