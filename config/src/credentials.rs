use serde::{
    Deserialize,
    Serialize,
};

/// Length of a UUID in its canonical, hyphenated form.
const UUID_LENGTH: usize = 36;

/// API keys for one Kontent.ai environment. Any key may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentCredentials {
    pub environment_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
}

/// Subscription-wide credentials used for project discovery and active user counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCredentials {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub api_key: String,
}

impl EnvironmentCredentials {
    pub fn new(environment_id: impl ToString) -> Self {
        Self {
            environment_id: environment_id.to_string(),
            ..Default::default()
        }
    }

    pub fn environment_id(&self) -> &str {
        self.environment_id.trim()
    }

    pub fn delivery_api_key(&self) -> Option<&str> {
        non_blank(&self.delivery_api_key)
    }

    pub fn management_api_key(&self) -> Option<&str> {
        non_blank(&self.management_api_key)
    }

    pub fn subscription_api_key(&self) -> Option<&str> {
        non_blank(&self.subscription_api_key)
    }

    pub fn subscription_id(&self) -> Option<&str> {
        non_blank(&self.subscription_id)
    }

    /// Both halves of the subscription credential, if present.
    pub fn subscription(&self) -> Option<SubscriptionCredentials> {
        match (self.subscription_id(), self.subscription_api_key()) {
            (Some(id), Some(api_key)) => Some(SubscriptionCredentials {
                id: id.to_string(),
                api_key: api_key.to_string(),
            }),
            _ => None,
        }
    }

    /// Fills in subscription credentials that are not set on this environment.
    pub fn with_subscription_fallback(mut self, subscription: Option<&SubscriptionCredentials>) -> Self {
        if let Some(subscription) = subscription {
            if self.subscription_id().is_none() {
                self.subscription_id = Some(subscription.id.clone());
            }
            if self.subscription_api_key().is_none() {
                self.subscription_api_key = Some(subscription.api_key.clone());
            }
        }
        self
    }

    /// Checks the entry the way the credentials form does before a collection run.
    /// `position` is the 1-based index used in the messages.
    pub fn validate(&self, position: usize) -> Vec<String> {
        let mut errors = Vec::new();
        let id = self.environment_id();

        if id.is_empty() {
            errors.push(format!("Environment {position}: Environment ID is required"));
            return errors;
        }
        if !is_uuid_length(id) {
            errors.push(format!(
                "Environment {position}: Environment ID must be {UUID_LENGTH} characters (UUID format)"
            ));
            return errors;
        }
        if self.subscription_id().is_some_and(|sub| !is_uuid_length(sub)) {
            errors.push(format!(
                "Environment {position}: Subscription ID must be {UUID_LENGTH} characters (UUID format)"
            ));
        }
        if self.delivery_api_key().is_none()
            && self.management_api_key().is_none()
            && self.subscription_api_key().is_none()
        {
            errors.push(format!(
                "Environment {position}: At least one API key is required (Delivery, Management, or Subscription)"
            ));
        }
        errors
    }
}

impl SubscriptionCredentials {
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !is_uuid_length(self.id.trim()) {
            errors.push(format!("Subscription ID must be {UUID_LENGTH} characters (UUID format)"));
        }
        if self.api_key.trim().is_empty() {
            errors.push("Subscription API key is required".to_string());
        }
        errors
    }
}

pub fn is_uuid_length(id: &str) -> bool {
    id.trim().len() == UUID_LENGTH
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
