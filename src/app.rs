use crate::{
    export,
    report::{
        self,
        UsageReport,
    },
};
use chrono::Utc;
use color_eyre::{
    eyre::{
        bail,
        Context as _,
    },
    Result,
};
use serde::Serialize;
use std::{
    io::IsTerminal as _,
    path::{
        Path,
        PathBuf,
    },
};
use strum::Display;
use usage_insights_collector::{
    clients::SubscriptionClient,
    discover_environments,
    ApiFailure,
    ApiResponse,
    ApiSource,
    CollectionEvent,
    CollectionStatus,
    EnvironmentAggregator,
    EnvironmentLookup,
    Orchestrator,
    ProjectSummary,
    Settings,
};
use usage_insights_config::{
    Args,
    Command,
    Config,
    EnvironmentCredentials,
    OutputFormat,
    SubscriptionCredentials,
};

pub struct App {
    args: Args,
    config: Config,
    settings: Settings,
}

/// The key a pre-flight check verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckedKey {
    #[strum(to_string = "Delivery API key")]
    Delivery,
    #[strum(to_string = "Management API key")]
    Management,
    #[strum(to_string = "Subscription ID")]
    SubscriptionId,
    #[strum(to_string = "Subscription API key")]
    SubscriptionKey,
}

impl CheckedKey {
    /// A failed Subscription check blames the ID for 400 and 404, the key otherwise.
    fn subscription(failure: Option<&ApiFailure>) -> Self {
        match failure.and_then(|failure| failure.status) {
            Some(400 | 404) => CheckedKey::SubscriptionId,
            _ => CheckedKey::SubscriptionKey,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    pub key: CheckedKey,
    #[serde(flatten)]
    pub response: ApiResponse<()>,
}

impl KeyCheck {
    fn new(environment_id: Option<&str>, key: CheckedKey, result: Result<(), ApiFailure>) -> Self {
        Self {
            environment_id: environment_id.map(str::to_string),
            key,
            response: result.into(),
        }
    }

    fn passed(&self) -> bool {
        self.response.success
    }
}

impl std::fmt::Display for KeyCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let target = match &self.environment_id {
            Some(environment_id) => format!("{environment_id} {}", self.key),
            None => self.key.to_string(),
        };
        match &self.response.error {
            None => write!(f, "✓ {target}: OK"),
            Some(failure) => write!(f, "✗ {target}: {}", failure.message),
        }
    }
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = Config::new(&args).wrap_err("Failed to load the configuration")?;
        let settings = Settings::try_from(&config)?;
        debug!(data_dir = %config.data_dir().display(), "Configuration loaded");
        Ok(Self { args, config, settings })
    }

    pub async fn run(self) -> Result<()> {
        match &self.args.command {
            Command::Collect {
                all_environments,
                format,
                output,
            } => self.collect(*all_environments, *format, output.as_deref()).await,
            Command::Check { json } => self.check(*json).await,
            Command::Projects { json } => self.projects(*json).await,
        }
    }

    /// The configured subscription, validated.
    fn subscription(&self) -> Result<SubscriptionCredentials> {
        let Some(subscription) = self.config.subscription.clone() else {
            bail!("Subscription credentials are required. Pass --subscription-id and --subscription-key.");
        };
        let errors = subscription.validate();
        if !errors.is_empty() {
            bail!(errors.join("\n"));
        }
        Ok(subscription)
    }

    async fn fetch_projects(&self, subscription: &SubscriptionCredentials) -> Result<Vec<ProjectSummary>> {
        let client = SubscriptionClient::new(&self.settings, subscription)?;
        let projects = client
            .get_projects()
            .await
            .wrap_err("Failed to list the projects of the subscription")?;
        info!(projects = projects.len(), "Fetched subscription projects");
        Ok(projects)
    }

    async fn collect(&self, all_environments: bool, format: OutputFormat, output: Option<&Path>) -> Result<()> {
        let (environments, lookup) = if all_environments {
            let subscription = self.subscription()?;
            let projects = self.fetch_projects(&subscription).await?;
            let environments = discover_environments(&projects, &self.config.environment_credentials(), &subscription);
            (environments, EnvironmentLookup::new(&projects))
        } else {
            let errors = self.config.validate_credentials();
            if !errors.is_empty() {
                bail!("Invalid credentials:\n{}", errors.join("\n"));
            }
            let environments = self.config.environment_credentials();
            let failed: Vec<KeyCheck> = self
                .check_keys(&environments)
                .await
                .into_iter()
                .filter(|check| !check.passed())
                .collect();
            if !failed.is_empty() {
                let lines: Vec<String> = failed.iter().map(ToString::to_string).collect();
                bail!("API key validation failed:\n{}", lines.join("\n"));
            }
            (environments, EnvironmentLookup::default())
        };

        if environments.is_empty() {
            bail!("No environments to collect. Pass --environment-id or configure `environments`.");
        }

        let listener = |event: &CollectionEvent| log_event(&lookup, event);
        let mut orchestrator = Orchestrator::new(self.settings.clone());
        let collected = orchestrator.collect(&environments, &listener).await;

        let failed = orchestrator
            .progress()
            .iter()
            .filter(|progress| matches!(progress.status, CollectionStatus::Failed(_)))
            .count();
        if collected.is_empty() {
            bail!("Data collection failed for every environment");
        }
        if failed > 0 {
            warn!(failed, "Some environments are missing from the report");
        }

        let report = UsageReport::new(&collected, &lookup);
        let styled = output.is_none() && std::io::stdout().is_terminal();
        let rendered = match format {
            OutputFormat::Table => report::render(&report, styled),
            OutputFormat::Json => export::to_json(&report, Utc::now())?,
            OutputFormat::Csv => export::to_csv(&report),
        };
        write_output(output, format, &rendered)
    }

    /// Runs the key checks of every environment, then the Subscription check once per subscription, including a
    /// configured subscription without environments.
    async fn check_keys(&self, environments: &[EnvironmentCredentials]) -> Vec<KeyCheck> {
        let aggregator = EnvironmentAggregator::new(self.settings.clone());
        let mut checks = Vec::new();
        let mut subscriptions: Vec<SubscriptionCredentials> = Vec::new();

        for credentials in environments {
            let environment_id = credentials.environment_id();
            if environment_id.is_empty() {
                continue;
            }
            if let Some(key) = credentials.delivery_api_key() {
                let result = aggregator.test_delivery_api_key(environment_id, key).await;
                checks.push(KeyCheck::new(Some(environment_id), CheckedKey::Delivery, result));
            }
            if let Some(key) = credentials.management_api_key() {
                let result = aggregator.test_management_api_key(environment_id, key).await;
                checks.push(KeyCheck::new(Some(environment_id), CheckedKey::Management, result));
            }
            if let Some(subscription) = credentials.subscription() {
                if !subscriptions.contains(&subscription) {
                    subscriptions.push(subscription);
                }
            }
        }

        if let Some(subscription) = &self.config.subscription {
            if subscription.validate().is_empty() && !subscriptions.contains(subscription) {
                subscriptions.push(subscription.clone());
            }
        }

        for subscription in &subscriptions {
            let result = match SubscriptionClient::new(&self.settings, subscription) {
                Ok(client) => client.test_subscription_api_key().await,
                Err(error) => Err(error.into()),
            };
            let key = CheckedKey::subscription(result.as_ref().err());
            checks.push(KeyCheck::new(None, key, result));
        }
        checks
    }

    async fn check(&self, json: bool) -> Result<()> {
        let errors = self.config.validate_credentials();
        if !errors.is_empty() {
            bail!("Invalid credentials:\n{}", errors.join("\n"));
        }

        let checks = self.check_keys(&self.config.environment_credentials()).await;
        if checks.is_empty() {
            bail!("No API keys to check. Pass credentials or configure `environments`.");
        }

        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&checks).wrap_err("Failed to serialize the key checks")?
            );
        } else {
            for check in &checks {
                println!("{check}");
            }
        }

        let failed = checks.iter().filter(|check| !check.passed()).count();
        if failed > 0 {
            bail!("{failed} of {} API key checks failed", checks.len());
        }
        Ok(())
    }

    async fn projects(&self, json: bool) -> Result<()> {
        let subscription = self.subscription()?;
        let projects = self.fetch_projects(&subscription).await?;
        if json {
            println!(
                "{}",
                serde_json::to_string_pretty(&projects).wrap_err("Failed to serialize the projects")?
            );
        } else {
            println!("{}", report::render_projects(&projects, std::io::stdout().is_terminal()));
        }
        Ok(())
    }
}

fn log_event(lookup: &EnvironmentLookup, event: &CollectionEvent) {
    match event {
        CollectionEvent::EnvironmentStarted {
            environment_id,
            position,
            total,
        } => match lookup.get(environment_id) {
            Some(label) => info!(
                "[{position}/{total}] Collecting data for {} ({environment_id}) of {}",
                label.environment_name, label.project_name
            ),
            None => info!("[{position}/{total}] Collecting data for Environment {position} ({environment_id})"),
        },
        CollectionEvent::SourceFailed {
            environment_id,
            api,
            message,
        } => {
            let hint = match api {
                ApiSource::Delivery => "check that the key has 'Content preview' access",
                ApiSource::Management => "check the Management API key",
                ApiSource::Subscription => "check the Subscription ID and API key",
            };
            warn!(%environment_id, "{message}; {hint}");
        }
        CollectionEvent::EnvironmentCompleted { environment_id } => {
            debug!(%environment_id, "{}", CollectionStatus::Completed);
        }
        CollectionEvent::EnvironmentFailed {
            environment_id,
            message,
        } => {
            error!(%environment_id, "{}", CollectionStatus::Failed(message.clone()));
        }
    }
}

/// Writes to stdout, to `output`, or into the directory `output` under the default export name.
fn write_output(output: Option<&Path>, format: OutputFormat, rendered: &str) -> Result<()> {
    let Some(output) = output else {
        println!("{rendered}");
        return Ok(());
    };
    let path: PathBuf = if output.is_dir() {
        output.join(export::default_file_name(format, Utc::now().date_naive()))
    } else {
        output.to_path_buf()
    };
    std::fs::write(&path, format!("{rendered}\n"))
        .wrap_err_with(|| format!("Failed to write the report to {}", path.display()))?;
    info!("Report written to {}", path.display());
    Ok(())
}
