use crate::report::{
    compare_names,
    format_number,
    ReportRow,
    UsageReport,
};
use chrono::{
    DateTime,
    NaiveDate,
    SecondsFormat,
    Utc,
};
use color_eyre::{
    eyre::Context as _,
    Result,
};
use serde::Serialize;
use serde_json::{
    Map,
    Value,
};
use strum::IntoEnumIterator;
use usage_insights_collector::ReportedMetric;
use usage_insights_config::OutputFormat;

const FILE_PREFIX: &str = "kontent-ai-usage-insights";

/// `kontent-ai-usage-insights-<YYYY-MM-DD>.<ext>`
pub fn default_file_name(format: OutputFormat, date: NaiveDate) -> String {
    format!("{FILE_PREFIX}-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    projects: Option<Vec<JsonProject<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    environments: Option<Vec<JsonEnvironment<'a>>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonProject<'a> {
    project_id: &'a str,
    project_name: &'a str,
    environments: Vec<JsonEnvironment<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEnvironment<'a> {
    environment_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    environment_name: Option<&'a str>,
    metrics: Map<String, Value>,
}

fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
        Value::from(value as u64)
    } else {
        Value::from(value)
    }
}

impl<'a> JsonEnvironment<'a> {
    fn new(row: &ReportRow<'a>, with_name: bool) -> Self {
        let data = row.data;
        let metrics = ReportedMetric::iter()
            .map(|metric| (metric.json_key().to_string(), json_number(metric.value(&data.metrics))))
            .collect();
        Self {
            environment_id: &data.environment_id,
            environment_name: with_name.then(|| row.environment_name()),
            metrics,
        }
    }
}

/// Exports raw metric values: grouped by project when projects are known, else as a flat list.
pub fn to_json(report: &UsageReport, generated_at: DateTime<Utc>) -> Result<String> {
    let with_names = report.has_environment_names();
    let generated_at = generated_at.to_rfc3339_opts(SecondsFormat::Millis, true);

    let export = if report.has_project_info() {
        let mut projects: Vec<JsonProject> = report
            .projects()
            .into_iter()
            .map(|(project_id, rows)| JsonProject {
                project_id,
                project_name: rows
                    .first()
                    .map(|row| row.project_name())
                    .filter(|name| !name.is_empty())
                    .unwrap_or("Unknown Project"),
                environments: rows.iter().map(|row| JsonEnvironment::new(row, with_names)).collect(),
            })
            .collect();
        projects.sort_by(|a, b| compare_names(a.project_name, b.project_name));
        JsonReport {
            generated_at,
            projects: Some(projects),
            environments: None,
        }
    } else {
        JsonReport {
            generated_at,
            projects: None,
            environments: Some(
                report
                    .rows()
                    .iter()
                    .map(|row| JsonEnvironment::new(row, with_names))
                    .collect(),
            ),
        }
    };

    serde_json::to_string_pretty(&export).wrap_err("Failed to serialize the usage report")
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Exports raw metric values, one line per environment. Name columns are only present when known.
pub fn to_csv(report: &UsageReport) -> String {
    let with_names = report.has_environment_names();
    let with_projects = with_names && report.has_project_info();

    let mut header: Vec<String> = if with_projects {
        vec!["Project name".into(), "Environment name".into(), "Environment ID".into()]
    } else if with_names {
        vec!["Environment ID".into(), "Environment name".into()]
    } else {
        vec!["Environment ID".into()]
    };
    header.extend(ReportedMetric::iter().map(|metric| metric.to_string()));

    let mut lines = vec![header.join(",")];
    for row in report.rows() {
        let mut fields: Vec<String> = if with_projects {
            vec![
                csv_field(row.project_name()),
                csv_field(row.environment_name()),
                csv_field(&row.data.environment_id),
            ]
        } else if with_names {
            vec![csv_field(&row.data.environment_id), csv_field(row.environment_name())]
        } else {
            vec![csv_field(&row.data.environment_id)]
        };
        fields.extend(
            ReportedMetric::iter().map(|metric| format_number(metric.value(&row.data.metrics))),
        );
        lines.push(fields.join(","));
    }
    lines.join("\n")
}
