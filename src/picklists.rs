// Picklist provisioning. The categorical fields of the seeded objects
// validate against list-type definitions, so those lists must exist
// before any record upload. Two strategies are supported: one-shot
// (definition and entries in a single POST, keys sent as defined) and
// two-step (empty definition first, then one POST per entry with a
// normalized key). Two-step exists because the platform silently drops
// entries whose keys contain underscores when they arrive inline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{ApiClient, CreatedResource, Outcome, LIST_TYPE_ENDPOINT};
use crate::remap::normalize_key;
use crate::report::Tally;
use crate::ui;
use crate::upload::{submit_with_retry, BatchOptions, Pacer};

/// One key/label pair of a picklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PicklistEntry {
    pub key: String,
    pub name: String,
    #[serde(default, rename = "name_i18n", skip_serializing_if = "Option::is_none")]
    pub name_i18n: Option<Value>,
    #[serde(
        default,
        rename = "externalReferenceCode",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_reference_code: Option<String>,
}

impl PicklistEntry {
    /// Entry as it appears inline in a one-shot definition payload. Keys
    /// go out exactly as defined.
    fn inline_payload(&self) -> Value {
        let mut payload = json!({
            "key": self.key,
            "name": self.name,
            "name_i18n": self.i18n(),
        });
        if let Some(code) = &self.external_reference_code {
            payload["externalReferenceCode"] = json!(code);
        }
        payload
    }

    /// Entry as POSTed to the list-type-entries endpoint in the two-step
    /// flow: key normalized, reference code derived when absent.
    pub fn entry_payload(&self, list_code: &str) -> Value {
        let code = self
            .external_reference_code
            .clone()
            .unwrap_or_else(|| format!("{list_code}_{}", self.key.to_uppercase()));
        json!({
            "key": normalize_key(&self.key),
            "name": self.name,
            "name_i18n": self.i18n(),
            "externalReferenceCode": code,
        })
    }

    fn i18n(&self) -> Value {
        self.name_i18n
            .clone()
            .unwrap_or_else(|| json!({ "en-US": self.name }))
    }
}

/// A named enumeration as the platform stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Picklist {
    pub name: String,
    #[serde(default, rename = "name_i18n", skip_serializing_if = "Option::is_none")]
    pub name_i18n: Option<Value>,
    #[serde(default, rename = "externalReferenceCode")]
    pub external_reference_code: String,
    #[serde(default, rename = "listTypeEntries")]
    pub entries: Vec<PicklistEntry>,
}

impl Picklist {
    /// Admin-API payload for the definition. With `include_entries` this
    /// is the complete one-shot body; without, the empty shell the
    /// two-step flow starts from.
    pub fn definition_payload(&self, include_entries: bool) -> Value {
        let name_i18n = self
            .name_i18n
            .clone()
            .unwrap_or_else(|| json!({ "en-US": self.name }));
        let mut payload = json!({
            "defaultLanguageId": "en-US",
            "externalReferenceCode": self.external_reference_code,
            "name": self.name,
            "name_i18n": name_i18n,
            "system": false,
        });
        if include_entries {
            payload["listTypeEntries"] =
                Value::Array(self.entries.iter().map(PicklistEntry::inline_payload).collect());
        }
        payload
    }
}

fn standard(code: &str, name: &str, entries: &[(&str, &str)]) -> Picklist {
    Picklist {
        name: name.to_string(),
        name_i18n: None,
        external_reference_code: code.to_string(),
        entries: entries
            .iter()
            .map(|(key, label)| PicklistEntry {
                key: key.to_string(),
                name: label.to_string(),
                name_i18n: None,
                external_reference_code: Some(format!("{code}_{}", key.to_uppercase())),
            })
            .collect(),
    }
}

/// The built-in definitions every target instance needs. Keys here are
/// the exact values the record transformer produces; CLIENT_STATUS is
/// the one list provisioned with capitalized keys.
pub fn standard_picklists() -> Vec<Picklist> {
    vec![
        standard(
            "CLIENT_STATUS",
            "Client Status",
            &[
                ("Active", "Active"),
                ("Prospect", "Prospect"),
                ("Inactive", "Inactive"),
                ("Suspended", "Suspended"),
            ],
        ),
        standard(
            "LOAN_STATUS",
            "Loan Status",
            &[
                ("application", "Application"),
                ("underreview", "Under Review"),
                ("approved", "Approved"),
                ("active", "Active"),
                ("paidoff", "Paid Off"),
                ("default", "Default"),
                ("rejected", "Rejected"),
            ],
        ),
        standard(
            "DEAL_STATUS",
            "Deal Status",
            &[
                ("lead", "Lead"),
                ("qualified", "Qualified"),
                ("proposal", "Proposal Sent"),
                ("negotiation", "In Negotiation"),
                ("closedwon", "Closed Won"),
                ("closedlost", "Closed Lost"),
            ],
        ),
        standard(
            "DEAL_PRIORITY",
            "Deal Priority",
            &[
                ("low", "Low"),
                ("medium", "Medium"),
                ("high", "High"),
                ("critical", "Critical"),
            ],
        ),
        standard(
            "ACTIVITY_STATUS",
            "Activity Status",
            &[
                ("planned", "Planned"),
                ("inprogress", "In Progress"),
                ("completed", "Completed"),
                ("cancelled", "Cancelled"),
                ("onhold", "On Hold"),
            ],
        ),
        standard(
            "ACTIVITY_TYPE",
            "Activity Type",
            &[
                ("clientmeeting", "Client Meeting"),
                ("phonecall", "Phone Call"),
                ("documentreview", "Document Review"),
                ("duediligence", "Due Diligence"),
                ("riskassessment", "Risk Assessment"),
                ("creditanalysis", "Credit Analysis"),
                ("compliancecheck", "Compliance Check"),
            ],
        ),
    ]
}

/// Load definitions from a directory of JSON files. A file without an
/// `externalReferenceCode` gets one derived from its name, so
/// `loan_status.json` becomes `LOAN_STATUS`.
pub fn load_picklists_dir(dir: &Path) -> Result<Vec<Picklist>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        bail!("no .json picklist files in {}", dir.display());
    }

    let mut lists = Vec::with_capacity(paths.len());
    for path in paths {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut list: Picklist = serde_json::from_str(&text)
            .with_context(|| format!("{} is not a valid picklist definition", path.display()))?;
        if list.name.is_empty() {
            bail!("{} has no \"name\"", path.display());
        }
        if list.external_reference_code.is_empty() {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or_default();
            list.external_reference_code = stem.to_uppercase();
        }
        lists.push(list);
    }
    Ok(lists)
}

/// Create every definition, tallying per list. A two-step list counts as
/// failed when its definition or any of its entries fails.
pub fn run_picklist_upload(
    api: &ApiClient,
    lists: &[Picklist],
    two_step: bool,
    opts: &BatchOptions,
) -> Tally {
    let mut tally = Tally::new("picklists");
    let mut pacer = Pacer::new(opts.pace);

    for (i, list) in lists.iter().enumerate() {
        println!(
            "[{}/{}] {} ({} entries)",
            i + 1,
            lists.len(),
            list.name,
            list.entries.len()
        );
        let result = if two_step {
            create_two_step(api, list, &mut pacer, opts)
        } else {
            create_one_shot(api, list, &mut pacer, opts)
        };
        match result {
            Ok(()) => {
                println!("  {} {}", "OK".green(), list.external_reference_code);
                tally.record_success();
            }
            Err(detail) => {
                println!(
                    "  {} {}: {}",
                    "FAIL".red(),
                    list.external_reference_code,
                    detail
                );
                tally.record_failure(i + 1, Some(list.external_reference_code.clone()), detail);
            }
        }
    }
    tally
}

fn create_one_shot(
    api: &ApiClient,
    list: &Picklist,
    pacer: &mut Pacer,
    opts: &BatchOptions,
) -> std::result::Result<(), String> {
    let payload = list.definition_payload(true);
    let outcome = submit_with_retry(pacer, &opts.retry, || {
        api.post_json(LIST_TYPE_ENDPOINT, &payload)
    });
    if outcome.is_success() {
        Ok(())
    } else {
        Err(outcome.describe())
    }
}

fn create_two_step(
    api: &ApiClient,
    list: &Picklist,
    pacer: &mut Pacer,
    opts: &BatchOptions,
) -> std::result::Result<(), String> {
    let payload = list.definition_payload(false);
    let mut created: Option<CreatedResource> = None;
    let outcome = submit_with_retry(pacer, &opts.retry, || {
        match api.create_resource(LIST_TYPE_ENDPOINT, &payload) {
            Ok(resource) => {
                created = Some(resource);
                Outcome::Created
            }
            Err(outcome) => outcome,
        }
    });
    if !outcome.is_success() {
        return Err(format!("definition: {}", outcome.describe()));
    }
    let created = created.ok_or_else(|| "definition: response had no id".to_string())?;

    let mut failed: Vec<String> = Vec::new();
    for entry in &list.entries {
        let payload = entry.entry_payload(&list.external_reference_code);
        let outcome = submit_with_retry(pacer, &opts.retry, || {
            api.add_picklist_entry(created.id, &payload)
        });
        if !outcome.is_success() {
            failed.push(format!("{}: {}", entry.key, outcome.describe()));
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        let shown = failed.iter().take(3).cloned().collect::<Vec<_>>().join("; ");
        Err(format!(
            "{}/{} entries failed ({shown})",
            failed.len(),
            list.entries.len()
        ))
    }
}

/// Print what the instance already has. Read-only, so any failure here
/// is an error, not a tally line.
pub fn run_picklist_check(api: &ApiClient) -> Result<()> {
    let spinner = ui::spinner("Fetching list-type definitions...");
    let result = api.list_picklists();
    spinner.finish_and_clear();
    let items = result?;

    println!("Found {} list-type definitions", items.len());
    for item in &items {
        let code = if item.external_reference_code.is_empty() {
            "(no reference code)"
        } else {
            item.external_reference_code.as_str()
        };
        println!("  {:<28} {:<24} {} entries", code, item.name, item.entries.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remap;

    /// Which standard list a remap table's output must land in.
    fn list_for(entity: &str, field: &str) -> &'static str {
        match (entity, field) {
            ("clients", "clientStatus") => "CLIENT_STATUS",
            ("loans", "loanStatus") => "LOAN_STATUS",
            ("deals", "dealStatus") => "DEAL_STATUS",
            ("deals", "priority") => "DEAL_PRIORITY",
            ("activities", "activityStatus") => "ACTIVITY_STATUS",
            ("activities", "activityType") => "ACTIVITY_TYPE",
            other => panic!("no standard list mapped for {other:?}"),
        }
    }

    #[test]
    fn every_remap_target_is_a_standard_picklist_key() {
        let lists = standard_picklists();
        for table in remap::ALL_TABLES {
            let code = list_for(table.entity, table.field);
            let list = lists
                .iter()
                .find(|l| l.external_reference_code == code)
                .unwrap_or_else(|| panic!("missing standard list {code}"));
            let keys: Vec<&str> = list.entries.iter().map(|e| e.key.as_str()).collect();
            for target in table.targets() {
                assert!(
                    keys.contains(&target),
                    "{}.{} can produce {target:?} but {code} has no such key",
                    table.entity,
                    table.field
                );
            }
        }
    }

    #[test]
    fn standard_lists_have_unique_codes_and_entries() {
        let lists = standard_picklists();
        assert_eq!(lists.len(), 6);
        let mut codes: Vec<&str> = lists
            .iter()
            .map(|l| l.external_reference_code.as_str())
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 6);
        for list in &lists {
            assert!(!list.entries.is_empty(), "{} is empty", list.name);
        }
    }

    #[test]
    fn one_shot_payload_carries_entries_and_housekeeping() {
        let lists = standard_picklists();
        let client_status = &lists[0];
        let payload = client_status.definition_payload(true);
        assert_eq!(payload["defaultLanguageId"], json!("en-US"));
        assert_eq!(payload["system"], json!(false));
        assert_eq!(payload["externalReferenceCode"], json!("CLIENT_STATUS"));
        assert_eq!(payload["name_i18n"]["en-US"], json!("Client Status"));
        let entries = payload["listTypeEntries"].as_array().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0]["key"], json!("Active"));
        assert_eq!(
            entries[0]["externalReferenceCode"],
            json!("CLIENT_STATUS_ACTIVE")
        );

        let shell = client_status.definition_payload(false);
        assert!(shell.get("listTypeEntries").is_none());
    }

    #[test]
    fn two_step_entry_payload_normalizes_the_key() {
        let entry = PicklistEntry {
            key: "client_meeting".into(),
            name: "Client Meeting".into(),
            name_i18n: None,
            external_reference_code: None,
        };
        let payload = entry.entry_payload("ACTIVITY_TYPE");
        assert_eq!(payload["key"], json!("clientmeeting"));
        assert_eq!(
            payload["externalReferenceCode"],
            json!("ACTIVITY_TYPE_CLIENT_MEETING")
        );
        assert_eq!(payload["name_i18n"]["en-US"], json!("Client Meeting"));
    }

    #[test]
    fn directory_loader_derives_code_from_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("loan_status.json"),
            r#"{"name": "Loan Status", "listTypeEntries": [{"key": "active", "name": "Active"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("README.txt"), "not a picklist").unwrap();

        let lists = load_picklists_dir(dir.path()).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].external_reference_code, "LOAN_STATUS");
        assert_eq!(lists[0].entries.len(), 1);
    }

    #[test]
    fn directory_loader_rejects_empty_dir_and_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_picklists_dir(dir.path()).is_err());

        fs::write(dir.path().join("broken.json"), "{").unwrap();
        assert!(load_picklists_dir(dir.path()).is_err());
    }
}
