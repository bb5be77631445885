// The dataset catalog: which record collections exist, where their JSON
// files live, which object endpoint each one posts to, and how a stable
// external reference code is derived per record. `prepare` turns one raw
// record into the exact body we POST.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde_json::Value;

use crate::remap::{self, JsonMap};

/// Fields the platform owns. They show up in exported data but must never
/// be sent back on create, or the API rejects the record.
pub const SERVER_OWNED_FIELDS: [&str; 5] =
    ["id", "dateCreated", "dateModified", "creator", "createDate"];

/// All record collections this tool can seed, in dependency order:
/// clients before the loans and deals that reference them, metrics last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Dataset {
    Clients,
    Loans,
    Deals,
    Activities,
    Performance,
    Risk,
    Workflow,
}

impl Dataset {
    pub const ALL: [Dataset; 7] = [
        Dataset::Clients,
        Dataset::Loans,
        Dataset::Deals,
        Dataset::Activities,
        Dataset::Performance,
        Dataset::Risk,
        Dataset::Workflow,
    ];

    /// Short name, also the key the remap tables are registered under.
    pub fn key(self) -> &'static str {
        match self {
            Dataset::Clients => "clients",
            Dataset::Loans => "loans",
            Dataset::Deals => "deals",
            Dataset::Activities => "activities",
            Dataset::Performance => "performance",
            Dataset::Risk => "risk",
            Dataset::Workflow => "workflow",
        }
    }

    /// Object REST endpoint the records are POSTed to.
    pub fn endpoint(self) -> &'static str {
        match self {
            Dataset::Clients => "/o/c/maestroclients/",
            Dataset::Loans => "/o/c/maestroloans/",
            Dataset::Deals => "/o/c/maestrodeals/",
            Dataset::Activities => "/o/c/gfdactivities/",
            Dataset::Performance => "/o/c/performancekpis/",
            Dataset::Risk => "/o/c/riskmetricses/",
            Dataset::Workflow => "/o/c/workflowmetrics/",
        }
    }

    /// File the dataset is read from (and written to by `generate`).
    pub fn file_name(self) -> &'static str {
        match self {
            Dataset::Clients => "clients.json",
            Dataset::Loans => "loans.json",
            Dataset::Deals => "deals.json",
            Dataset::Activities => "activities.json",
            Dataset::Performance => "performance_kpis.json",
            Dataset::Risk => "risk_metrics.json",
            Dataset::Workflow => "workflow_metrics.json",
        }
    }

    /// Record field carrying the natural identifier, where one exists.
    /// Metrics snapshots have no identifier of their own; their reference
    /// code is derived from the report date instead.
    fn id_field(self) -> Option<&'static str> {
        match self {
            Dataset::Clients => Some("clientId"),
            Dataset::Loans => Some("loanId"),
            Dataset::Deals => Some("dealId"),
            Dataset::Activities => Some("activityId"),
            Dataset::Performance | Dataset::Risk | Dataset::Workflow => None,
        }
    }

    /// Derive the `externalReferenceCode` for one record. Uploads are
    /// create-only, so the code does not make reruns idempotent; it exists
    /// so records can be found and related after seeding.
    pub fn reference_code(self, record: &JsonMap) -> Result<String> {
        if let Some(field) = self.id_field() {
            return match record.get(field).and_then(Value::as_str) {
                Some(id) if !id.is_empty() => Ok(id.to_string()),
                _ => bail!("{} record has no usable {field}", self.key()),
            };
        }
        let date = match record.get("reportDate").and_then(Value::as_str) {
            Some(d) if !d.is_empty() => d,
            _ => bail!("{} record has no usable reportDate", self.key()),
        };
        Ok(match self {
            Dataset::Performance => {
                let period = record
                    .get("periodType")
                    .and_then(Value::as_str)
                    .unwrap_or("Monthly");
                format!("KPI-{date}-{period}")
            }
            Dataset::Risk => format!("RISK-{date}"),
            Dataset::Workflow => format!("WORKFLOW-{date}"),
            _ => unreachable!("datasets with an id field return above"),
        })
    }
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Read a dataset file. Accepts both shapes the exports come in: a bare
/// JSON array, or an object with an `items` array.
pub fn load_records(path: &Path) -> Result<Vec<JsonMap>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    records_from_value(value).with_context(|| format!("in {}", path.display()))
}

fn records_from_value(value: Value) -> Result<Vec<JsonMap>> {
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut doc) => match doc.remove("items") {
            Some(Value::Array(entries)) => entries,
            Some(_) => bail!("\"items\" is not an array"),
            None => bail!("expected a JSON array or an object with an \"items\" array"),
        },
        _ => bail!("expected a JSON array or an object with an \"items\" array"),
    };
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Value::Object(map) => Ok(map),
            other => bail!("record {} is not a JSON object (got {other})", i + 1),
        })
        .collect()
}

/// Shape one raw record into its upload body: drop server-owned fields,
/// rewrite categorical values, then attach the derived reference code.
/// Errors here are data errors; the caller prepares a whole dataset before
/// sending anything so a bad file stops the run with nothing half-created.
pub fn prepare(dataset: Dataset, record: &JsonMap) -> Result<JsonMap> {
    let mut out = record.clone();
    for field in SERVER_OWNED_FIELDS {
        out.remove(field);
    }
    let mut out = remap::remap_entity(&out, dataset.key());
    let code = dataset.reference_code(&out)?;
    out.insert("externalReferenceCode".to_string(), Value::String(code));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> JsonMap {
        match value {
            Value::Object(m) => m,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn loads_items_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clients.json");
        fs::write(&path, r#"{"items": [{"clientId": "CL-ACM-001"}]}"#).unwrap();
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["clientId"], json!("CL-ACM-001"));
    }

    #[test]
    fn loads_bare_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loans.json");
        fs::write(&path, r#"[{"loanId": "LN-2025-1000"}, {"loanId": "LN-2025-1001"}]"#).unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn rejects_non_object_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"items": [42]}"#).unwrap();
        let err = load_records(&path).unwrap_err();
        assert!(format!("{err:#}").contains("record 1"));
    }

    #[test]
    fn prepare_strips_server_owned_fields() {
        let rec = map(json!({
            "clientId": "CL-ACM-001",
            "clientStatus": "active",
            "id": 99,
            "dateCreated": "2025-01-01T00:00:00Z",
            "creator": {"name": "admin"}
        }));
        let out = prepare(Dataset::Clients, &rec).unwrap();
        assert!(out.get("id").is_none());
        assert!(out.get("dateCreated").is_none());
        assert!(out.get("creator").is_none());
        assert_eq!(out["clientStatus"], json!("Active"));
        assert_eq!(out["externalReferenceCode"], json!("CL-ACM-001"));
    }

    #[test]
    fn prepare_derives_metric_reference_codes() {
        let kpi = map(json!({"reportDate": "2025-06-30", "periodType": "Quarterly"}));
        let out = prepare(Dataset::Performance, &kpi).unwrap();
        assert_eq!(out["externalReferenceCode"], json!("KPI-2025-06-30-Quarterly"));

        let kpi_no_period = map(json!({"reportDate": "2025-06-30"}));
        let out = prepare(Dataset::Performance, &kpi_no_period).unwrap();
        assert_eq!(out["externalReferenceCode"], json!("KPI-2025-06-30-Monthly"));

        let risk = map(json!({"reportDate": "2025-06-30"}));
        let out = prepare(Dataset::Risk, &risk).unwrap();
        assert_eq!(out["externalReferenceCode"], json!("RISK-2025-06-30"));

        let wf = map(json!({"reportDate": "2025-06-30"}));
        let out = prepare(Dataset::Workflow, &wf).unwrap();
        assert_eq!(out["externalReferenceCode"], json!("WORKFLOW-2025-06-30"));
    }

    #[test]
    fn prepare_fails_on_missing_identifier() {
        let rec = map(json!({"loanAmount": 1000}));
        assert!(prepare(Dataset::Loans, &rec).is_err());
        let rec = map(json!({"overallRiskScore": 42}));
        assert!(prepare(Dataset::Risk, &rec).is_err());
    }

    #[test]
    fn upload_order_starts_with_clients() {
        assert_eq!(Dataset::ALL[0], Dataset::Clients);
        assert_eq!(Dataset::ALL.len(), 7);
    }
}
