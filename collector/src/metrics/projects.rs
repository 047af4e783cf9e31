use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

/// Environment name that marks the production environment of a project.
const PRODUCTION_ENVIRONMENT: &str = "Production";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub environments: Vec<ProjectEnvironment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEnvironment {
    pub id: String,
    pub name: String,
    pub is_production: bool,
}

impl ProjectEnvironment {
    pub fn new(id: impl ToString, name: impl ToString) -> Self {
        let name = name.to_string();
        Self {
            id: id.to_string(),
            is_production: name.eq_ignore_ascii_case(PRODUCTION_ENVIRONMENT),
            name,
        }
    }
}

/// Display labels of one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentLabel {
    pub project_id: String,
    pub project_name: String,
    pub environment_name: String,
}

/// Maps environment ids to their project, for grouping and display.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentLookup {
    labels: HashMap<String, EnvironmentLabel>,
}

impl EnvironmentLookup {
    pub fn new(projects: &[ProjectSummary]) -> Self {
        let labels = projects
            .iter()
            .flat_map(|project| {
                project.environments.iter().map(move |environment| {
                    (
                        environment.id.clone(),
                        EnvironmentLabel {
                            project_id: project.id.clone(),
                            project_name: project.name.clone(),
                            environment_name: environment.name.clone(),
                        },
                    )
                })
            })
            .collect();
        Self { labels }
    }

    pub fn get(&self, environment_id: &str) -> Option<&EnvironmentLabel> {
        self.labels.get(environment_id)
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl From<&[ProjectSummary]> for EnvironmentLookup {
    fn from(projects: &[ProjectSummary]) -> Self {
        Self::new(projects)
    }
}
