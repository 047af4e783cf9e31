use comfy_table::{
    presets,
    Attribute,
    Cell,
    Color,
    ContentArrangement,
    Table,
};
use std::cmp::Ordering;
use strum::IntoEnumIterator;
use usage_insights_collector::{
    EnvironmentData,
    EnvironmentLabel,
    EnvironmentLookup,
    ProjectSummary,
    ReportedMetric,
};

pub const UNAVAILABLE: &str = "Unavailable";

/// One collected environment and its project label, if known.
#[derive(Debug, Clone, Copy)]
pub struct ReportRow<'a> {
    pub data: &'a EnvironmentData,
    pub label: Option<&'a EnvironmentLabel>,
}

impl<'a> ReportRow<'a> {
    pub fn project_id(&self) -> &'a str {
        self.label.map(|label| label.project_id.as_str()).unwrap_or_default()
    }

    pub fn project_name(&self) -> &'a str {
        self.label.map(|label| label.project_name.as_str()).unwrap_or_default()
    }

    /// The name from the subscription, else the generated one.
    pub fn environment_name(&self) -> &'a str {
        let data = self.data;
        self.label
            .map(|label| label.environment_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&data.name)
    }

    fn sort_key(&self) -> (&'a str, &'a str) {
        let environment_name = self.label.map(|label| label.environment_name.as_str()).unwrap_or_default();
        (self.project_name(), environment_name)
    }
}

/// Case-insensitive order, ties broken by the exact text.
pub(crate) fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// The collected environments in report order: by project name, then environment name.
#[derive(Debug, Clone)]
pub struct UsageReport<'a> {
    rows: Vec<ReportRow<'a>>,
}

impl<'a> UsageReport<'a> {
    pub fn new(environments: &'a [EnvironmentData], lookup: &'a EnvironmentLookup) -> Self {
        let mut rows: Vec<ReportRow<'a>> = environments
            .iter()
            .map(|data| ReportRow {
                data,
                label: lookup.get(&data.environment_id),
            })
            .collect();
        rows.sort_by(|a, b| {
            let (project_a, name_a) = a.sort_key();
            let (project_b, name_b) = b.sort_key();
            compare_names(project_a, project_b).then_with(|| compare_names(name_a, name_b))
        });
        Self { rows }
    }

    pub fn rows(&self) -> &[ReportRow<'a>] {
        &self.rows
    }

    /// Whether any environment has a name from the subscription.
    pub fn has_environment_names(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.label.is_some_and(|label| !label.environment_name.is_empty()))
    }

    /// Whether any environment belongs to a known project.
    pub fn has_project_info(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.label.is_some_and(|label| !label.project_name.is_empty()))
    }

    /// Rows grouped by project id, in report order.
    pub fn projects(&self) -> Vec<(&'a str, Vec<ReportRow<'a>>)> {
        let mut groups: Vec<(&'a str, Vec<ReportRow<'a>>)> = Vec::new();
        for row in &self.rows {
            match groups.iter_mut().find(|(project_id, _)| *project_id == row.project_id()) {
                Some((_, rows)) => rows.push(*row),
                None => groups.push((row.project_id(), vec![*row])),
            }
        }
        groups
    }
}

/// Plain number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    value.to_string()
}

fn header(labels: impl IntoIterator<Item = String>) -> Vec<Cell> {
    labels
        .into_iter()
        .map(|label| Cell::new(label).add_attribute(Attribute::Bold).fg(Color::Cyan))
        .collect()
}

fn metric_cells(row: &ReportRow) -> Vec<Cell> {
    ReportedMetric::iter()
        .map(|metric| match row.data.reported(metric) {
            Some(value) => Cell::new(format_number(value)),
            None => Cell::new(UNAVAILABLE).add_attribute(Attribute::Italic).fg(Color::DarkGrey),
        })
        .collect()
}

fn new_table(styled: bool) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if !styled {
        table.force_no_tty();
    }
    table
}

fn environments_table(rows: &[ReportRow], with_names: bool, styled: bool) -> Table {
    let mut table = new_table(styled);
    let mut labels = vec!["Environment ID".to_string()];
    if with_names {
        labels.push("Environment name".to_string());
    }
    labels.extend(ReportedMetric::iter().map(|metric| metric.to_string()));
    table.set_header(header(labels));

    for row in rows {
        let mut cells = vec![Cell::new(&row.data.environment_id)];
        if with_names {
            cells.push(Cell::new(row.environment_name()));
        }
        cells.extend(metric_cells(row));
        table.add_row(cells);
    }
    table
}

/// Renders the report as tables, one per project when projects are known. Metrics whose source key was not
/// supplied show as "Unavailable".
pub fn render(report: &UsageReport, styled: bool) -> String {
    let with_names = report.has_environment_names();
    if !report.has_project_info() {
        return environments_table(report.rows(), with_names, styled).to_string();
    }

    report
        .projects()
        .into_iter()
        .map(|(project_id, rows)| {
            let project_name = rows
                .first()
                .map(|row| row.project_name())
                .filter(|name| !name.is_empty())
                .unwrap_or("Unknown Project");
            let title = if project_id.is_empty() {
                project_name.to_string()
            } else {
                format!("{project_name} ({project_id})")
            };
            format!("{title}\n{}", environments_table(&rows, with_names, styled))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Renders the projects and environments visible to a subscription.
pub fn render_projects(projects: &[ProjectSummary], styled: bool) -> String {
    let mut table = new_table(styled);
    table.set_header(header(
        ["Project", "Project ID", "Environment", "Environment ID", "Production"].map(String::from),
    ));
    for project in projects {
        if project.environments.is_empty() {
            table.add_row(vec![
                Cell::new(&project.name),
                Cell::new(&project.id),
                Cell::new(""),
                Cell::new(""),
                Cell::new(""),
            ]);
        }
        for environment in &project.environments {
            table.add_row(vec![
                Cell::new(&project.name),
                Cell::new(&project.id),
                Cell::new(&environment.name),
                Cell::new(&environment.id),
                Cell::new(if environment.is_production { "yes" } else { "" }),
            ]);
        }
    }
    table.to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use usage_insights_collector::{
        ApiKeysAvailable,
        ProjectEnvironment,
        UsageMetrics,
    };

    pub(crate) fn environment(id: &str, keys: ApiKeysAvailable) -> EnvironmentData {
        let metrics = UsageMetrics {
            languages: 2,
            active_users: 7,
            asset_count: 3,
            asset_storage_size: 1_234_567,
            collections: 1,
            content_items: 40,
            content_types: 5,
            custom_roles: 2,
            spaces: 1,
            ..UsageMetrics::default()
        };
        EnvironmentData::new(id, metrics, keys)
    }

    pub(crate) fn all_keys() -> ApiKeysAvailable {
        ApiKeysAvailable {
            delivery: true,
            management: true,
            subscription: true,
        }
    }

    pub(crate) fn projects() -> Vec<ProjectSummary> {
        vec![
            ProjectSummary {
                id: "p-web".to_string(),
                name: "Website".to_string(),
                environments: vec![
                    ProjectEnvironment::new("e-prod", "Production"),
                    ProjectEnvironment::new("e-dev", "Develop"),
                ],
            },
            ProjectSummary {
                id: "p-app".to_string(),
                name: "app".to_string(),
                environments: vec![ProjectEnvironment::new("e-app", "Production")],
            },
        ]
    }

    #[test]
    fn rows_are_sorted_by_project_then_environment() {
        let environments = vec![
            environment("e-prod", all_keys()),
            environment("e-app", all_keys()),
            environment("e-dev", all_keys()),
        ];
        let lookup = EnvironmentLookup::new(&projects());
        let report = UsageReport::new(&environments, &lookup);

        let order: Vec<_> = report.rows().iter().map(|row| row.data.environment_id.as_str()).collect();
        assert_eq!(order, vec!["e-app", "e-dev", "e-prod"]);
        assert!(report.has_project_info());
        assert!(report.has_environment_names());

        let groups: Vec<_> = report
            .projects()
            .into_iter()
            .map(|(project_id, rows)| (project_id, rows.len()))
            .collect();
        assert_eq!(groups, vec![("p-app", 1), ("p-web", 2)]);
    }

    #[test]
    fn unlabeled_environments_keep_their_generated_name() {
        let environments = vec![environment("e-other", all_keys())];
        let lookup = EnvironmentLookup::default();
        let report = UsageReport::new(&environments, &lookup);

        assert!(!report.has_project_info());
        assert!(!report.has_environment_names());
        assert_eq!(report.rows()[0].environment_name(), "Environment e-other");
    }

    #[test]
    fn missing_keys_render_as_unavailable() {
        let keys = ApiKeysAvailable {
            delivery: true,
            management: false,
            subscription: false,
        };
        let environments = vec![environment("e-prod", keys)];
        let lookup = EnvironmentLookup::default();
        let rendered = render(&UsageReport::new(&environments, &lookup), false);

        assert!(rendered.contains("Environment ID"), "{rendered}");
        assert!(rendered.contains("e-prod"), "{rendered}");
        assert!(rendered.contains("40"), "{rendered}");
        // Active users and the five Management metrics.
        assert_eq!(rendered.matches(UNAVAILABLE).count(), 6, "{rendered}");
    }

    #[test]
    fn project_tables_have_titles() {
        let environments = vec![environment("e-prod", all_keys()), environment("e-app", all_keys())];
        let lookup = EnvironmentLookup::new(&projects());
        let rendered = render(&UsageReport::new(&environments, &lookup), false);

        let app = rendered.find("app (p-app)").unwrap();
        let website = rendered.find("Website (p-web)").unwrap();
        assert!(app < website, "{rendered}");
        assert!(rendered.contains("Environment name"), "{rendered}");
        assert!(!rendered.contains(UNAVAILABLE), "{rendered}");
    }

    #[test]
    fn whole_numbers_have_no_fraction() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1.23), "1.23");
    }
}
