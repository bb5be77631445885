// Object definition provisioning. Definitions are authored as JSON files
// (one per object), validated locally, POSTed to the object-admin API in
// dependency order, then published so the record endpoints come live.
// Publishing failures are warnings, not failures: a draft object can be
// published by hand, but a missing one cannot.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use colored::Colorize;
use serde_json::{json, Value};

use crate::api::{ApiClient, CreatedResource, Outcome, OBJECT_ADMIN_ENDPOINT, OBJECT_FOLDER_ENDPOINT};
use crate::report::Tally;
use crate::upload::{submit_with_retry, BatchOptions, Pacer};

/// Fields a definition file must carry before we send it anywhere.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "label", "objectFields", "pluralLabel", "scope"];

/// The folder the object definitions are grouped under.
pub const FOLDER_NAME: &str = "Maestro GFD Objects";
pub const FOLDER_CODE: &str = "MAESTRO_FOLDER_ERC";

/// Definition files in dependency order: clients before the loans and
/// deals that reference them, metrics last. Files not named here sort
/// after these, alphabetically.
const CANONICAL_ORDER: [&str; 7] = [
    "maestro-clients.object-definition.json",
    "maestro-loans.object-definition.json",
    "maestro-deals.object-definition.json",
    "maestro-gfd-activities.object-definition.json",
    "maestro-performance-kpis.object-definition.json",
    "maestro-risk-metrics.object-definition.json",
    "maestro-workflow-metrics.object-definition.json",
];

/// One object definition as loaded from disk. The document is kept as
/// raw JSON: the admin API accepts far more fields than we validate, and
/// passing unknown ones through is the point.
#[derive(Debug, Clone)]
pub struct ObjectDefinition {
    pub file_name: String,
    doc: Value,
}

impl ObjectDefinition {
    pub fn name(&self) -> &str {
        self.doc.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Human label; definition files carry either a plain string or an
    /// i18n map.
    pub fn label(&self) -> String {
        match self.doc.get("label") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(map)) => map
                .values()
                .filter_map(Value::as_str)
                .next()
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        }
    }

    pub fn field_count(&self) -> usize {
        self.doc
            .get("objectFields")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn folder_reference(&self) -> Option<&str> {
        self.doc
            .get("objectFolderExternalReferenceCode")
            .and_then(Value::as_str)
    }

    pub fn body(&self) -> &Value {
        &self.doc
    }
}

/// Load and validate one definition file.
pub fn load_definition(path: &Path) -> Result<ObjectDefinition> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    if !doc.is_object() {
        bail!("{} is not a JSON object", path.display());
    }
    for field in REQUIRED_FIELDS {
        if doc.get(field).is_none() {
            bail!("{} is missing required field {field:?}", path.display());
        }
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    Ok(ObjectDefinition { file_name, doc })
}

/// Load every `*.json` definition in a directory, in dependency order.
/// Any invalid file aborts before a single definition is sent.
pub fn load_definitions_dir(dir: &Path) -> Result<Vec<ObjectDefinition>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    if paths.is_empty() {
        bail!("no .json object definitions in {}", dir.display());
    }
    paths.sort_by_key(|p| {
        let file_name = p
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let rank = CANONICAL_ORDER
            .iter()
            .position(|n| *n == file_name)
            .unwrap_or(CANONICAL_ORDER.len());
        (rank, file_name)
    });
    paths.iter().map(|p| load_definition(p)).collect()
}

/// What an `objects create` invocation is going to do.
#[derive(Debug, Clone)]
pub struct ObjectPlan {
    pub dir: PathBuf,
    pub publish: bool,
    pub folder: bool,
}

/// Create (and optionally publish) every definition in the plan.
/// Creation failures land in the tally; publish failures only warn.
pub fn run_object_create(api: &ApiClient, plan: &ObjectPlan, opts: &BatchOptions) -> Result<Tally> {
    let definitions = load_definitions_dir(&plan.dir)?;
    let mut tally = Tally::new("objects");
    let mut pacer = Pacer::new(opts.pace);
    let mut published = 0usize;

    if plan.folder {
        ensure_folder(api, &mut pacer, opts);
    }

    for (i, def) in definitions.iter().enumerate() {
        println!(
            "[{}/{}] {} - {} ({} fields)",
            i + 1,
            definitions.len(),
            def.name(),
            def.label(),
            def.field_count()
        );
        if def.folder_reference().is_none() {
            println!(
                "  {} {} has no objectFolderExternalReferenceCode",
                "warning:".yellow(),
                def.file_name
            );
        }

        let mut created: Option<CreatedResource> = None;
        let outcome = submit_with_retry(&mut pacer, &opts.retry, || {
            match api.create_resource(OBJECT_ADMIN_ENDPOINT, def.body()) {
                Ok(resource) => {
                    created = Some(resource);
                    Outcome::Created
                }
                Err(outcome) => outcome,
            }
        });

        match (outcome.is_success(), created) {
            (true, Some(resource)) => {
                match &resource.rest_context_path {
                    Some(path) => {
                        println!("  {} id {} -> {}", "OK".green(), resource.id, path)
                    }
                    None => println!("  {} id {}", "OK".green(), resource.id),
                }
                tally.record_success();
                if plan.publish {
                    let publish = submit_with_retry(&mut pacer, &opts.retry, || {
                        api.publish_object(resource.id)
                    });
                    if publish.is_success() {
                        published += 1;
                    } else {
                        println!(
                            "  {} publish failed: {}",
                            "warning:".yellow(),
                            publish.describe()
                        );
                    }
                }
            }
            _ => {
                let detail = outcome.describe();
                println!("  {} {}", "FAIL".red(), detail);
                tally.record_failure(i + 1, Some(def.name().to_string()), detail);
            }
        }
    }

    if plan.publish {
        println!("Published {published}/{} definitions", tally.succeeded());
    }
    Ok(tally)
}

/// Create the shared object folder. Failure here only warns: an existing
/// folder rejects the duplicate reference code, and that is fine.
fn ensure_folder(api: &ApiClient, pacer: &mut Pacer, opts: &BatchOptions) {
    let payload = json!({
        "name": FOLDER_NAME,
        "externalReferenceCode": FOLDER_CODE,
    });
    let mut created: Option<CreatedResource> = None;
    let outcome = submit_with_retry(pacer, &opts.retry, || {
        match api.create_resource(OBJECT_FOLDER_ENDPOINT, &payload) {
            Ok(resource) => {
                created = Some(resource);
                Outcome::Created
            }
            Err(outcome) => outcome,
        }
    });
    match (outcome.is_success(), created) {
        (true, Some(folder)) => println!("{} folder {FOLDER_CODE} (id {})", "OK".green(), folder.id),
        _ => println!(
            "{} folder not created: {}",
            "warning:".yellow(),
            outcome.describe()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_definition(dir: &Path, file_name: &str, doc: &Value) {
        fs::write(dir.join(file_name), serde_json::to_string_pretty(doc).unwrap()).unwrap();
    }

    fn minimal(name: &str) -> Value {
        json!({
            "name": name,
            "label": {"en_US": name},
            "pluralLabel": {"en_US": format!("{name}s")},
            "scope": "company",
            "objectFields": [{"name": "clientId", "DBType": "String"}],
            "objectFolderExternalReferenceCode": FOLDER_CODE,
        })
    }

    #[test]
    fn valid_definition_loads_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "maestro-clients.object-definition.json", &minimal("MaestroClient"));
        let def =
            load_definition(&dir.path().join("maestro-clients.object-definition.json")).unwrap();
        assert_eq!(def.name(), "MaestroClient");
        assert_eq!(def.label(), "MaestroClient");
        assert_eq!(def.field_count(), 1);
        assert_eq!(def.folder_reference(), Some(FOLDER_CODE));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = minimal("MaestroLoan");
        doc.as_object_mut().unwrap().remove("pluralLabel");
        write_definition(dir.path(), "loan.json", &doc);
        let err = load_definition(&dir.path().join("loan.json")).unwrap_err();
        assert!(format!("{err:#}").contains("pluralLabel"));
    }

    #[test]
    fn directory_load_uses_dependency_order() {
        let dir = tempfile::tempdir().unwrap();
        // Written out of order on purpose.
        write_definition(dir.path(), "maestro-loans.object-definition.json", &minimal("MaestroLoan"));
        write_definition(dir.path(), "aaa-custom.json", &minimal("Custom"));
        write_definition(dir.path(), "maestro-clients.object-definition.json", &minimal("MaestroClient"));

        let defs = load_definitions_dir(dir.path()).unwrap();
        let names: Vec<&str> = defs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "maestro-clients.object-definition.json",
                "maestro-loans.object-definition.json",
                "aaa-custom.json",
            ]
        );
    }

    #[test]
    fn one_bad_file_fails_the_whole_load() {
        let dir = tempfile::tempdir().unwrap();
        write_definition(dir.path(), "good.json", &minimal("Good"));
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        assert!(load_definitions_dir(dir.path()).is_err());
    }

    #[test]
    fn string_labels_are_accepted_too() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = minimal("MaestroDeal");
        doc["label"] = json!("Maestro Deal");
        write_definition(dir.path(), "deal.json", &doc);
        let def = load_definition(&dir.path().join("deal.json")).unwrap();
        assert_eq!(def.label(), "Maestro Deal");
    }

    #[test]
    fn shipped_definitions_load_in_order_and_reference_known_picklists() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("objects");
        let defs = load_definitions_dir(&dir).unwrap();

        let names: Vec<&str> = defs.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, CANONICAL_ORDER.to_vec());

        let known: Vec<String> = crate::picklists::standard_picklists()
            .into_iter()
            .map(|list| list.external_reference_code)
            .collect();
        for def in &defs {
            assert_eq!(def.folder_reference(), Some(FOLDER_CODE), "{}", def.file_name);
            let fields = def.body().get("objectFields").and_then(Value::as_array).unwrap();
            for field in fields {
                if let Some(code) = field
                    .get("listTypeDefinitionExternalReferenceCode")
                    .and_then(Value::as_str)
                {
                    assert!(
                        known.contains(&code.to_string()),
                        "{} references picklist {code} that seeding never creates",
                        def.file_name
                    );
                }
            }
        }
    }
}
