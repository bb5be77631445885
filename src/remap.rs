// Categorical field remapping. The sample datasets carry human-friendly
// snake_case values ("under_review", "client_meeting") while the platform
// picklists only accept the compact keys they were provisioned with
// ("underreview", "clientmeeting"). Each table below rewrites one field of
// one entity; unknown source values fall back to the table's default so a
// batch never aborts on vocabulary drift.

use serde_json::{Map, Value};

pub type JsonMap = Map<String, Value>;

/// Rewrite rules for a single categorical field.
pub struct FieldTable {
    /// Dataset the table applies to ("clients", "loans", ...).
    pub entity: &'static str,
    /// Record field the table rewrites.
    pub field: &'static str,
    /// Picklist key substituted when the source value has no mapping,
    /// or when the record omits the field entirely.
    pub default: &'static str,
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldTable {
    /// Picklist key for one source value. Tables are small enough that a
    /// linear scan beats building a map.
    pub fn target(&self, source: &str) -> &'static str {
        self.pairs
            .iter()
            .find(|(from, _)| *from == source)
            .map(|(_, to)| *to)
            .unwrap_or(self.default)
    }

    /// Every key this table can produce, default included.
    pub fn targets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.pairs
            .iter()
            .map(|(_, to)| *to)
            .chain(std::iter::once(self.default))
    }
}

pub static CLIENT_STATUS: FieldTable = FieldTable {
    entity: "clients",
    field: "clientStatus",
    // CLIENT_STATUS is the one picklist provisioned with capitalized keys.
    default: "Active",
    pairs: &[
        ("active", "Active"),
        ("prospect", "Prospect"),
        ("inactive", "Inactive"),
        ("suspended", "Suspended"),
    ],
};

pub static LOAN_STATUS: FieldTable = FieldTable {
    entity: "loans",
    field: "loanStatus",
    default: "application",
    pairs: &[
        ("application", "application"),
        ("pending", "underreview"),
        ("under_review", "underreview"),
        ("underreview", "underreview"),
        ("approved", "approved"),
        ("active", "active"),
        ("paid_off", "paidoff"),
        ("paidoff", "paidoff"),
        ("default", "default"),
        ("rejected", "rejected"),
    ],
};

pub static DEAL_STATUS: FieldTable = FieldTable {
    entity: "deals",
    field: "dealStatus",
    default: "lead",
    pairs: &[
        ("lead", "lead"),
        ("qualified", "qualified"),
        ("proposal", "proposal"),
        ("negotiation", "negotiation"),
        ("closed_won", "closedwon"),
        ("closedwon", "closedwon"),
        ("closed_lost", "closedlost"),
        ("closedlost", "closedlost"),
        // Stages the generator knows but the picklist does not.
        ("due_diligence", "qualified"),
        ("approved", "closedwon"),
        ("closed", "closedwon"),
    ],
};

pub static DEAL_PRIORITY: FieldTable = FieldTable {
    entity: "deals",
    field: "priority",
    default: "medium",
    pairs: &[
        ("low", "low"),
        ("medium", "medium"),
        ("high", "high"),
        ("critical", "critical"),
    ],
};

pub static ACTIVITY_STATUS: FieldTable = FieldTable {
    entity: "activities",
    field: "activityStatus",
    default: "planned",
    pairs: &[
        ("planned", "planned"),
        ("in_progress", "inprogress"),
        ("inprogress", "inprogress"),
        ("completed", "completed"),
        ("cancelled", "cancelled"),
        ("on_hold", "onhold"),
        ("onhold", "onhold"),
        ("exception", "onhold"),
    ],
};

pub static ACTIVITY_TYPE: FieldTable = FieldTable {
    entity: "activities",
    field: "activityType",
    default: "documentreview",
    pairs: &[
        ("client_meeting", "clientmeeting"),
        ("clientmeeting", "clientmeeting"),
        ("phone_call", "phonecall"),
        ("phonecall", "phonecall"),
        ("document_review", "documentreview"),
        ("documentreview", "documentreview"),
        ("due_diligence", "duediligence"),
        ("duediligence", "duediligence"),
        ("risk_assessment", "riskassessment"),
        ("riskassessment", "riskassessment"),
        ("credit_analysis", "creditanalysis"),
        ("creditanalysis", "creditanalysis"),
        ("compliance_check", "compliancecheck"),
        ("compliancecheck", "compliancecheck"),
        // Workflow stage names that show up as activity types in older
        // exports.
        ("credit", "creditanalysis"),
        ("origination", "duediligence"),
        ("distribution", "documentreview"),
        ("system", "compliancecheck"),
    ],
};

/// Every table in the crate, in upload order.
pub static ALL_TABLES: &[&FieldTable] = &[
    &CLIENT_STATUS,
    &LOAN_STATUS,
    &DEAL_STATUS,
    &DEAL_PRIORITY,
    &ACTIVITY_STATUS,
    &ACTIVITY_TYPE,
];

/// Tables that apply to one entity. Metrics datasets have no categorical
/// fields, so an empty result is normal.
pub fn tables_for(entity: &str) -> Vec<&'static FieldTable> {
    ALL_TABLES
        .iter()
        .copied()
        .filter(|t| t.entity == entity)
        .collect()
}

/// Apply every matching table to one record. String values are rewritten
/// through the table, absent fields get the default, and any non-string
/// value is left untouched. This never fails: the whole point is that a
/// surprising value becomes a safe key instead of a rejected record.
pub fn remap_entity(record: &JsonMap, entity: &str) -> JsonMap {
    let mut out = record.clone();
    for table in tables_for(entity) {
        let target = match out.get(table.field) {
            Some(Value::String(raw)) => table.target(raw),
            Some(_) => continue,
            None => table.default,
        };
        out.insert(table.field.to_string(), Value::String(target.to_string()));
    }
    out
}

/// Collapse a picklist entry key the way the admin API stores it: strip
/// everything that is not ASCII alphanumeric, then lowercase. The platform
/// silently drops entries whose keys contain underscores, which is exactly
/// the bug this crate exists to avoid.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(pairs: &[(&str, Value)]) -> JsonMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn known_values_are_rewritten() {
        assert_eq!(LOAN_STATUS.target("pending"), "underreview");
        assert_eq!(LOAN_STATUS.target("paid_off"), "paidoff");
        assert_eq!(DEAL_STATUS.target("due_diligence"), "qualified");
        assert_eq!(ACTIVITY_TYPE.target("client_meeting"), "clientmeeting");
    }

    #[test]
    fn unknown_values_fall_back_to_default() {
        assert_eq!(LOAN_STATUS.target("totally-new-stage"), "application");
        assert_eq!(DEAL_PRIORITY.target("urgent"), "medium");
        assert_eq!(CLIENT_STATUS.target("ACTIVE"), "Active");
    }

    #[test]
    fn already_valid_keys_pass_through() {
        assert_eq!(LOAN_STATUS.target("underreview"), "underreview");
        assert_eq!(ACTIVITY_STATUS.target("onhold"), "onhold");
    }

    #[test]
    fn remap_rewrites_only_categorical_fields() {
        let rec = record(&[
            ("loanId", json!("LN-2025-1001")),
            ("loanStatus", json!("under_review")),
            ("principalAmount", json!(2_500_000.0)),
        ]);
        let out = remap_entity(&rec, "loans");
        assert_eq!(out["loanStatus"], json!("underreview"));
        assert_eq!(out["loanId"], json!("LN-2025-1001"));
        assert_eq!(out["principalAmount"], json!(2_500_000.0));
    }

    #[test]
    fn missing_field_gets_the_default() {
        let rec = record(&[("dealId", json!("DL-2025-0301"))]);
        let out = remap_entity(&rec, "deals");
        assert_eq!(out["dealStatus"], json!("lead"));
        assert_eq!(out["priority"], json!("medium"));
    }

    #[test]
    fn non_string_values_are_left_alone() {
        let rec = record(&[("loanStatus", json!(7))]);
        let out = remap_entity(&rec, "loans");
        assert_eq!(out["loanStatus"], json!(7));
    }

    #[test]
    fn entities_without_tables_pass_through_unchanged() {
        let rec = record(&[("reportDate", json!("2025-06-30"))]);
        assert_eq!(remap_entity(&rec, "performance"), rec);
    }

    #[test]
    fn normalize_key_strips_and_lowercases() {
        assert_eq!(normalize_key("client_meeting"), "clientmeeting");
        assert_eq!(normalize_key("Closed Won"), "closedwon");
        assert_eq!(normalize_key("paid-off"), "paidoff");
        assert_eq!(normalize_key("active"), "active");
    }
}
