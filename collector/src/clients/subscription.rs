use super::{
    endpoint,
    null_as_empty,
    ApiClient,
    ContinuationPage,
    ContinuationPagination,
};
use crate::{
    error::{
        ApiError,
        ApiFailure,
        CollectionError,
    },
    metrics::{
        ProjectEnvironment,
        ProjectSummary,
    },
    Settings,
};
use serde::Deserialize;
use url::Url;
use usage_insights_config::SubscriptionCredentials;

#[derive(Debug, Deserialize)]
pub struct ProjectsPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<SubscriptionProject>,
    #[serde(default)]
    pub pagination: ContinuationPagination,
}

impl ContinuationPage for ProjectsPage {
    fn continuation_token(&self) -> Option<&str> {
        self.pagination.continuation_token.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionProject {
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environments: Vec<SubscriptionEnvironment>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionEnvironment {
    pub id: String,
    pub name: String,
}

impl From<SubscriptionProject> for ProjectSummary {
    fn from(project: SubscriptionProject) -> Self {
        Self {
            id: project.id,
            name: project.name,
            environments: project
                .environments
                .into_iter()
                .map(|environment| ProjectEnvironment::new(environment.id, environment.name))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UsersPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub users: Vec<SubscriptionUser>,
    #[serde(default)]
    pub pagination: ContinuationPagination,
}

impl ContinuationPage for UsersPage {
    fn continuation_token(&self) -> Option<&str> {
        self.pagination.continuation_token.as_deref()
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionUser {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub projects: Vec<UserProject>,
}

#[derive(Debug, Deserialize)]
pub struct UserProject {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub environments: Vec<UserEnvironment>,
}

#[derive(Debug, Deserialize)]
pub struct UserEnvironment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub is_user_active: Option<bool>,
}

impl SubscriptionUser {
    /// Whether the e-mail address belongs to the given domain suffix, e.g. `@kontent.ai`.
    pub fn has_email_domain(&self, domain: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| email.to_lowercase().ends_with(&domain.to_lowercase()))
    }

    /// Whether any assignment to the environment is active. Stops at the first match.
    pub fn is_active_in(&self, environment_id: &str) -> bool {
        self.projects.iter().any(|project| {
            project.environments.iter().any(|environment| {
                environment.id.as_deref() == Some(environment_id) && environment.is_user_active == Some(true)
            })
        })
    }
}

/// Subscription API client.
#[derive(Debug)]
pub struct SubscriptionClient {
    api: ApiClient,
    projects: Url,
    users: Url,
}

impl SubscriptionClient {
    pub fn new(settings: &Settings, credentials: &SubscriptionCredentials) -> Result<Self, CollectionError> {
        let management = &settings.endpoints.management;
        let subscription_id = credentials.id.trim();
        Ok(Self {
            api: ApiClient::new(credentials.api_key.trim(), settings.request_timeout)?,
            projects: endpoint(management, &["subscriptions", subscription_id, "projects"])?,
            users: endpoint(management, &["subscriptions", subscription_id, "users"])?,
        })
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, ApiError> {
        let mut projects = Vec::new();
        self.api
            .for_each_page(&self.projects, |page: ProjectsPage| {
                projects.extend(page.projects.into_iter().map(ProjectSummary::from));
            })
            .await?;
        Ok(projects)
    }

    /// Fetches only the first page of projects.
    pub async fn first_projects_page(&self) -> Result<ProjectsPage, ApiError> {
        self.api.get_json(&self.projects, &[]).await
    }

    /// Pre-flight check of the subscription credentials: fetches one page of projects.
    pub async fn test_subscription_api_key(&self) -> Result<(), ApiFailure> {
        self.first_projects_page()
            .await
            .map(|_| ())
            .map_err(|error| ApiFailure::new(error.status, error.subscription_message()))
    }

    /// All projects of the subscription with their environments.
    pub async fn get_projects(&self) -> Result<Vec<ProjectSummary>, ApiFailure> {
        self.list_projects().await.map_err(|error| {
            warn!(%error, "Failed to list subscription projects");
            ApiFailure::new(error.status, error.subscription_message())
        })
    }

    /// Walks all user pages sequentially. Returns the number of requests made.
    pub async fn for_each_users_page<F>(&self, on_page: F) -> Result<usize, ApiError>
    where
        F: FnMut(UsersPage),
    {
        self.api.for_each_page(&self.users, on_page).await
    }
}
