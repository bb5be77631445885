// Synthetic dataset generator. Produces the seven dataset files the
// uploader consumes, populated with plausible European corporate-banking
// data. Categorical fields are written in the source vocabulary (some of
// it snake_case or legacy), not the platform keys; shaping them is the
// transformer's job, and generating them raw keeps that path exercised.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::catalog::Dataset;

struct CompanyRef {
    name: &'static str,
    sector: &'static str,
    country: &'static str,
    revenue: f64,
    rating: &'static str,
}

const COMPANIES: &[CompanyRef] = &[
    CompanyRef { name: "LVMH Moët Hennessy", sector: "Consumer Goods", country: "France", revenue: 79_183_000_000.0, rating: "AA-" },
    CompanyRef { name: "TotalEnergies SE", sector: "Energy", country: "France", revenue: 184_000_000_000.0, rating: "A-" },
    CompanyRef { name: "EDF Group", sector: "Utilities", country: "France", revenue: 84_500_000_000.0, rating: "A" },
    CompanyRef { name: "Air France-KLM", sector: "Transportation", country: "France", revenue: 26_762_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Schneider Electric", sector: "Technology", country: "France", revenue: 34_178_000_000.0, rating: "A+" },
    CompanyRef { name: "Airbus SE", sector: "Aerospace", country: "France", revenue: 70_478_000_000.0, rating: "A" },
    CompanyRef { name: "Sanofi SA", sector: "Healthcare", country: "France", revenue: 44_407_000_000.0, rating: "A+" },
    CompanyRef { name: "Carrefour Group", sector: "Retail", country: "France", revenue: 87_911_000_000.0, rating: "BBB" },
    CompanyRef { name: "Orange SA", sector: "Telecommunications", country: "France", revenue: 42_515_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Veolia Environnement", sector: "Environmental Services", country: "France", revenue: 29_525_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Thales Group", sector: "Defense & Aerospace", country: "France", revenue: 16_183_000_000.0, rating: "A-" },
    CompanyRef { name: "Danone SA", sector: "Food & Beverages", country: "France", revenue: 24_281_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Société Générale", sector: "Financial Services", country: "France", revenue: 25_014_000_000.0, rating: "A-" },
    CompanyRef { name: "BNP Paribas", sector: "Financial Services", country: "France", revenue: 44_306_000_000.0, rating: "A" },
    CompanyRef { name: "L'Oréal SA", sector: "Consumer Goods", country: "France", revenue: 38_260_000_000.0, rating: "AA-" },
    CompanyRef { name: "Michelin Group", sector: "Manufacturing", country: "France", revenue: 28_589_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Renault Group", sector: "Automotive", country: "France", revenue: 46_214_000_000.0, rating: "BB+" },
    CompanyRef { name: "Vinci SA", sector: "Construction", country: "France", revenue: 58_038_000_000.0, rating: "A-" },
    CompanyRef { name: "ASML Holding", sector: "Technology", country: "Netherlands", revenue: 21_172_000_000.0, rating: "AA-" },
    CompanyRef { name: "ING Group", sector: "Financial Services", country: "Netherlands", revenue: 18_766_000_000.0, rating: "A-" },
    CompanyRef { name: "Philips NV", sector: "Healthcare", country: "Netherlands", revenue: 18_164_000_000.0, rating: "BBB" },
    CompanyRef { name: "Siemens AG", sector: "Technology", country: "Germany", revenue: 72_004_000_000.0, rating: "A" },
    CompanyRef { name: "SAP SE", sector: "Technology", country: "Germany", revenue: 31_218_000_000.0, rating: "AA-" },
    CompanyRef { name: "BMW Group", sector: "Automotive", country: "Germany", revenue: 142_610_000_000.0, rating: "A-" },
    CompanyRef { name: "BASF SE", sector: "Chemicals", country: "Germany", revenue: 78_595_000_000.0, rating: "A-" },
    CompanyRef { name: "Deutsche Telekom", sector: "Telecommunications", country: "Germany", revenue: 108_790_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Nestlé SA", sector: "Food & Beverages", country: "Switzerland", revenue: 94_380_000_000.0, rating: "AA" },
    CompanyRef { name: "Novartis AG", sector: "Healthcare", country: "Switzerland", revenue: 50_034_000_000.0, rating: "AA-" },
    CompanyRef { name: "Ericsson AB", sector: "Technology", country: "Sweden", revenue: 25_262_000_000.0, rating: "BBB" },
    CompanyRef { name: "Nokia Corporation", sector: "Technology", country: "Finland", revenue: 24_915_000_000.0, rating: "BBB" },
    CompanyRef { name: "Banco Santander", sector: "Financial Services", country: "Spain", revenue: 50_399_000_000.0, rating: "A-" },
    CompanyRef { name: "Iberdrola SA", sector: "Utilities", country: "Spain", revenue: 44_067_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Inditex SA", sector: "Retail", country: "Spain", revenue: 32_569_000_000.0, rating: "A-" },
    CompanyRef { name: "Enel SpA", sector: "Utilities", country: "Italy", revenue: 95_301_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Intesa Sanpaolo", sector: "Financial Services", country: "Italy", revenue: 21_618_000_000.0, rating: "BBB+" },
    CompanyRef { name: "AB InBev", sector: "Food & Beverages", country: "Belgium", revenue: 57_786_000_000.0, rating: "BBB+" },
    CompanyRef { name: "Accenture plc", sector: "Technology", country: "Ireland", revenue: 64_111_000_000.0, rating: "A" },
    CompanyRef { name: "CRH plc", sector: "Construction", country: "Ireland", revenue: 34_706_000_000.0, rating: "BBB+" },
];

const SECTORS: &[&str] = &[
    "Energy", "Financial Services", "Technology", "Healthcare", "Manufacturing", "Retail",
    "Transportation", "Telecommunications", "Utilities", "Consumer Goods", "Automotive",
    "Aerospace", "Construction", "Food & Beverages", "Chemicals", "Defense & Aerospace",
    "Environmental Services",
];

const LOAN_TYPES: &[&str] = &[
    "Corporate Credit Line", "Term Loan", "Infrastructure Financing", "Working Capital",
    "Green Bond", "Syndicated Loan", "Bridge Financing", "Equipment Financing",
    "Trade Financing", "Project Finance", "Acquisition Finance", "Real Estate Finance",
    "Asset-Based Lending", "Revolving Credit", "Export Finance",
];

const DEAL_TYPES: &[&str] = &[
    "Syndicated Loan", "Bond Issuance", "Credit Facility", "Term Loan", "Green Financing",
    "Acquisition Finance", "Infrastructure Bond", "Corporate Credit Line", "Project Finance",
    "Trade Finance",
];

const RELATIONSHIP_MANAGERS: &[&str] = &[
    "Marie Dubois", "Jean-Pierre Martin", "Claire Lefevre", "Antoine Rousseau",
    "Sophie Bernard", "Philippe Moreau", "Catherine Durand", "Laurent Petit",
    "Isabelle Roux", "Nicolas Girard", "Sylvie Mercier", "François Blanc",
    "Nathalie Simon", "Pierre Garnier", "Céline Fabre",
];

const CREDIT_RATINGS: &[&str] = &[
    "AAA", "AA+", "AA", "AA-", "A+", "A", "A-", "BBB+", "BBB", "BBB-",
];

const CURRENCIES: &[&str] = &["EUR", "USD", "GBP"];

const LEGAL_ENTITY_TYPES: &[&str] = &[
    "Public Limited Company", "Private Limited Company", "State-Owned Enterprise", "Cooperative",
];

const LOAN_PURPOSES: &[&str] = &[
    "Business expansion and market growth",
    "Equipment acquisition and modernization",
    "Working capital optimization",
    "Sustainability and ESG initiatives",
    "Digital transformation projects",
    "Acquisition and merger financing",
    "Infrastructure development",
    "Research and development funding",
    "Supply chain optimization",
    "International market entry",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub client_id: String,
    pub client_name: String,
    pub legal_entity_type: String,
    pub country: String,
    pub sector: String,
    pub credit_rating: String,
    pub annual_revenue: f64,
    pub relationship_start_date: String,
    pub relationship_manager: String,
    pub client_status: String,
    pub risk_classification: String,
    pub client_notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub loan_id: String,
    pub client_name: String,
    pub loan_amount: f64,
    pub currency: String,
    pub loan_type: String,
    pub loan_status: String,
    pub origination_date: String,
    pub maturity_date: String,
    pub interest_rate: f64,
    pub risk_rating: String,
    pub sector: String,
    pub purpose: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub deal_id: String,
    pub deal_name: String,
    pub client_name: String,
    pub deal_value: f64,
    pub currency: String,
    pub deal_status: String,
    pub priority: String,
    pub expected_closing_date: String,
    pub last_updated: String,
    pub deal_type: String,
    pub sector: String,
    pub relationship_manager: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub activity_id: String,
    pub activity_title: String,
    pub activity_description: String,
    pub activity_type: String,
    pub activity_status: String,
    pub activity_date: String,
    pub related_entity_id: String,
    pub related_entity_type: String,
    pub created_by: String,
    pub priority: String,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceKpi {
    pub report_date: String,
    pub total_loan_volume: f64,
    pub active_clients: i64,
    pub average_deal_size: f64,
    pub portfolio_growth: f64,
    pub revenue_generated: f64,
    pub default_rate: f64,
    pub return_on_assets: f64,
    pub period_type: String,
    pub performance_summary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetrics {
    pub report_date: String,
    pub total_risk_exposure: f64,
    pub high_risk_loans: i64,
    pub average_credit_score: f64,
    pub coverage_ratio: f64,
    pub credit_risk_percentage: f64,
    pub market_risk_percentage: f64,
    pub operational_risk_percentage: f64,
    pub risk_trend: String,
    pub risk_summary: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowMetrics {
    pub report_date: String,
    pub active_workflows: i64,
    pub avg_processing_time: f64,
    pub completion_rate: f64,
    pub exceptions: i64,
    pub origination_workflows: i64,
    pub credit_workflows: i64,
    pub distribution_workflows: i64,
    pub origination_progress: f64,
    pub credit_progress: f64,
    pub distribution_progress: f64,
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    // Vocabulary slices are non-empty consts.
    *items.choose(rng).unwrap()
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn days_ago(rng: &mut StdRng, today: NaiveDate, lo: i64, hi: i64) -> String {
    iso(today - Duration::days(rng.gen_range(lo..=hi)))
}

fn days_ahead(rng: &mut StdRng, today: NaiveDate, lo: i64, hi: i64) -> String {
    iso(today + Duration::days(rng.gen_range(lo..=hi)))
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Three-letter id prefix from a company name, non-alphanumerics dropped
/// so "L'Oréal SA" prefixes as LOR, not L'O.
fn id_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect();
    if prefix.is_empty() {
        "CLI".to_string()
    } else {
        prefix.to_uppercase()
    }
}

struct CompanyPick {
    name: String,
    sector: String,
    country: String,
    revenue: f64,
    rating: String,
}

pub fn generate_clients(rng: &mut StdRng, today: NaiveDate, count: usize) -> Vec<Client> {
    let mut available: Vec<&CompanyRef> = COMPANIES.iter().collect();
    let mut clients = Vec::with_capacity(count);

    for i in 0..count {
        let company = if available.is_empty() {
            // Ran out of real names; make one up.
            CompanyPick {
                name: format!("European Corp {}", i + 1),
                sector: pick(rng, SECTORS).to_string(),
                country: pick(rng, &["France", "Germany", "Netherlands", "Spain", "Italy"])
                    .to_string(),
                revenue: rng.gen_range(1_000_000_000..=50_000_000_000i64) as f64,
                rating: pick(rng, CREDIT_RATINGS).to_string(),
            }
        } else {
            let idx = rng.gen_range(0..available.len());
            let picked = available.swap_remove(idx);
            CompanyPick {
                name: picked.name.to_string(),
                sector: picked.sector.to_string(),
                country: picked.country.to_string(),
                revenue: picked.revenue,
                rating: picked.rating.to_string(),
            }
        };

        clients.push(Client {
            client_id: format!("CL-{}-{:03}", id_prefix(&company.name), i + 1),
            client_name: company.name.clone(),
            legal_entity_type: pick(rng, LEGAL_ENTITY_TYPES).to_string(),
            country: company.country,
            sector: company.sector.clone(),
            credit_rating: company.rating,
            annual_revenue: company.revenue,
            relationship_start_date: days_ago(rng, today, 365, 2555),
            relationship_manager: pick(rng, RELATIONSHIP_MANAGERS).to_string(),
            // Weighted toward active books.
            client_status: pick(rng, &["active", "active", "active", "active", "prospect", "inactive"])
                .to_string(),
            risk_classification: pick(rng, &["Low", "Medium", "High"]).to_string(),
            client_notes: format!(
                "Strategic relationship with {} sector leader. Strong ESG commitment and {} market presence.",
                company.sector.to_lowercase(),
                pick(rng, &["regional", "global", "european"])
            ),
        });
    }
    clients
}

pub fn generate_loans(rng: &mut StdRng, today: NaiveDate, count: usize) -> Vec<Loan> {
    (0..count)
        .map(|i| {
            let client = COMPANIES.choose(rng).unwrap();
            Loan {
                loan_id: format!("LN-2025-{:04}", i + 1000),
                client_name: client.name.to_string(),
                loan_amount: rng.gen_range(5_000_000..=500_000_000i64) as f64,
                currency: pick(rng, CURRENCIES).to_string(),
                loan_type: pick(rng, LOAN_TYPES).to_string(),
                loan_status: pick(
                    rng,
                    &["approved", "active", "active", "active", "underreview", "application", "paidoff"],
                )
                .to_string(),
                origination_date: days_ago(rng, today, 30, 1825),
                maturity_date: days_ahead(rng, today, 365, 3650),
                interest_rate: round2(rng.gen_range(2.5..=6.5)),
                risk_rating: pick(rng, CREDIT_RATINGS).to_string(),
                sector: pick(rng, SECTORS).to_string(),
                purpose: pick(rng, LOAN_PURPOSES).to_string(),
                notes: format!(
                    "Professional financing for {} objectives with strong {}.",
                    pick(rng, &["strategic", "operational", "growth", "sustainability"]),
                    pick(rng, &["market position", "financial metrics", "management team"])
                ),
            }
        })
        .collect()
}

pub fn generate_deals(rng: &mut StdRng, today: NaiveDate, count: usize) -> Vec<Deal> {
    (0..count)
        .map(|i| {
            let client = COMPANIES.choose(rng).unwrap();
            Deal {
                deal_id: format!("DL-2025-{:04}", i + 300),
                deal_name: format!(
                    "{} {} {}",
                    client.name,
                    pick(rng, &["Expansion", "Modernization", "Acquisition", "Sustainability", "Digital", "Infrastructure"]),
                    pick(rng, &["Facility", "Program", "Initiative", "Project"])
                ),
                client_name: client.name.to_string(),
                deal_value: rng.gen_range(50_000_000..=2_000_000_000i64) as f64,
                currency: pick(rng, CURRENCIES).to_string(),
                deal_status: pick(
                    rng,
                    &["lead", "qualified", "proposal", "negotiation", "closedwon", "closedlost"],
                )
                .to_string(),
                priority: pick(rng, &["low", "medium", "high", "critical"]).to_string(),
                expected_closing_date: days_ahead(rng, today, 30, 365),
                last_updated: days_ago(rng, today, 1, 30),
                deal_type: pick(rng, DEAL_TYPES).to_string(),
                sector: pick(rng, SECTORS).to_string(),
                relationship_manager: pick(rng, RELATIONSHIP_MANAGERS).to_string(),
                description: format!(
                    "Comprehensive {} solution for {} objectives in the {} sector.",
                    pick(rng, &["financing", "credit", "investment"]),
                    pick(rng, &["expansion", "modernization", "acquisition", "sustainability", "innovation"]),
                    pick(rng, SECTORS).to_lowercase()
                ),
            }
        })
        .collect()
}

pub fn generate_activities(rng: &mut StdRng, today: NaiveDate, count: usize) -> Vec<Activity> {
    (0..count)
        .map(|i| Activity {
            activity_id: format!("ACT-2025-{:05}", i + 1),
            activity_title: format!(
                "{} {} - {}",
                pick(rng, &["Loan", "Deal", "Client", "System"]),
                pick(rng, &["Review", "Analysis", "Processing", "Update", "Assessment", "Monitoring"]),
                pick(rng, &["Credit Approval", "Due Diligence", "Documentation", "Compliance Check", "Risk Assessment"])
            ),
            activity_description: format!(
                "Professional {} of {} with comprehensive {}.",
                pick(rng, &["analysis", "review", "assessment", "processing"]),
                pick(rng, &["credit application", "deal proposal", "client portfolio", "system integration"]),
                pick(rng, &["due diligence", "risk evaluation", "compliance verification"])
            ),
            // Legacy workflow stage names; the transformer folds them into
            // the picklist vocabulary.
            activity_type: pick(rng, &["credit", "origination", "distribution", "system"]).to_string(),
            activity_status: pick(
                rng,
                &["completed", "in_progress", "planned", "cancelled", "on_hold"],
            )
            .to_string(),
            activity_date: days_ago(rng, today, 1, 180),
            related_entity_id: format!(
                "{}{}",
                pick(rng, &["LN-2025-", "DL-2025-", "CL-"]),
                rng.gen_range(1000..=9999)
            ),
            related_entity_type: pick(rng, &["Loan", "Deal", "Client", "System", "Portfolio"])
                .to_string(),
            created_by: pick(rng, RELATIONSHIP_MANAGERS).to_string(),
            priority: pick(rng, &["low", "medium", "high", "urgent"]).to_string(),
            notes: format!(
                "Activity completed within standard {} timeframes with {} outcomes.",
                pick(rng, &["processing", "review", "assessment"]),
                pick(rng, &["positive", "satisfactory", "excellent"])
            ),
        })
        .collect()
}

pub fn generate_performance_kpis(
    rng: &mut StdRng,
    today: NaiveDate,
    count: usize,
) -> Vec<PerformanceKpi> {
    (0..count)
        .map(|i| PerformanceKpi {
            // One snapshot per month going backwards.
            report_date: iso(today - Duration::days(30 * i as i64)),
            total_loan_volume: (2_800_000_000 + rng.gen_range(-500_000_000..=500_000_000i64)) as f64,
            active_clients: 850 + rng.gen_range(-100..=200i64),
            average_deal_size: (45_000_000 + rng.gen_range(-10_000_000..=20_000_000i64)) as f64,
            portfolio_growth: round1(rng.gen_range(5.0..=18.0)),
            revenue_generated: rng.gen_range(120_000_000..=200_000_000i64) as f64,
            default_rate: round1(rng.gen_range(0.5..=2.5)),
            return_on_assets: round1(rng.gen_range(1.5..=3.5)),
            period_type: "Monthly".to_string(),
            performance_summary: format!(
                "Strong monthly performance with {} {} and {} credit quality metrics.",
                pick(rng, &["robust", "solid", "steady", "excellent"]),
                pick(rng, &["growth", "expansion", "development"]),
                pick(rng, &["maintained", "improved", "enhanced"])
            ),
        })
        .collect()
}

pub fn generate_risk_metrics(rng: &mut StdRng, today: NaiveDate, count: usize) -> Vec<RiskMetrics> {
    (0..count)
        .map(|i| RiskMetrics {
            report_date: iso(today - Duration::days(30 * i as i64)),
            total_risk_exposure: rng.gen_range(2_500_000_000..=4_000_000_000i64) as f64,
            high_risk_loans: rng.gen_range(8..=25),
            average_credit_score: round1(rng.gen_range(700.0..=750.0)),
            coverage_ratio: round2(rng.gen_range(1.5..=2.2)),
            credit_risk_percentage: round1(rng.gen_range(2.5..=4.5)),
            market_risk_percentage: round1(rng.gen_range(1.8..=3.2)),
            operational_risk_percentage: round1(rng.gen_range(1.5..=2.5)),
            risk_trend: pick(rng, &["stable", "improving", "deteriorating"]).to_string(),
            risk_summary: format!(
                "Portfolio risk levels {} acceptable parameters with {} credit quality and {} risk management.",
                pick(rng, &["remain within", "demonstrate", "show"]),
                pick(rng, &["strong", "adequate", "improved"]),
                pick(rng, &["effective", "robust", "comprehensive"])
            ),
        })
        .collect()
}

pub fn generate_workflow_metrics(
    rng: &mut StdRng,
    today: NaiveDate,
    count: usize,
) -> Vec<WorkflowMetrics> {
    (0..count)
        .map(|i| WorkflowMetrics {
            report_date: iso(today - Duration::days(30 * i as i64)),
            active_workflows: rng.gen_range(25..=45),
            avg_processing_time: round1(rng.gen_range(2.8..=4.5)),
            completion_rate: round3(rng.gen_range(0.92..=0.98)),
            exceptions: rng.gen_range(5..=15),
            origination_workflows: rng.gen_range(10..=20),
            credit_workflows: rng.gen_range(8..=18),
            distribution_workflows: rng.gen_range(5..=12),
            origination_progress: round1(rng.gen_range(65.0..=85.0)),
            credit_progress: round1(rng.gen_range(55.0..=75.0)),
            distribution_progress: round1(rng.gen_range(80.0..=95.0)),
        })
        .collect()
}

/// What a `generate` invocation is going to produce.
#[derive(Debug, Clone)]
pub struct GeneratePlan {
    pub out_dir: PathBuf,
    pub clients: usize,
    pub loans: usize,
    pub deals: usize,
    pub activities: usize,
    /// Monthly snapshot count shared by the three metrics datasets.
    pub snapshots: usize,
    pub seed: Option<u64>,
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    items: &'a [T],
}

fn write_dataset<T: Serialize>(dir: &Path, dataset: Dataset, items: &[T]) -> Result<()> {
    let path = dir.join(dataset.file_name());
    let text = serde_json::to_string_pretty(&Envelope { items })
        .context("Serializing generated dataset")?;
    fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Generated {}: {} records", dataset.file_name(), items.len());
    Ok(())
}

/// Generate all seven dataset files. With a fixed `seed` the output is
/// byte-for-byte reproducible for a given day.
pub fn run_generate(plan: &GeneratePlan) -> Result<()> {
    let mut rng = match plan.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let today = Utc::now().date_naive();

    fs::create_dir_all(&plan.out_dir)
        .with_context(|| format!("Failed to create {}", plan.out_dir.display()))?;

    write_dataset(&plan.out_dir, Dataset::Clients, &generate_clients(&mut rng, today, plan.clients))?;
    write_dataset(&plan.out_dir, Dataset::Loans, &generate_loans(&mut rng, today, plan.loans))?;
    write_dataset(&plan.out_dir, Dataset::Deals, &generate_deals(&mut rng, today, plan.deals))?;
    write_dataset(&plan.out_dir, Dataset::Activities, &generate_activities(&mut rng, today, plan.activities))?;
    write_dataset(&plan.out_dir, Dataset::Performance, &generate_performance_kpis(&mut rng, today, plan.snapshots))?;
    write_dataset(&plan.out_dir, Dataset::Risk, &generate_risk_metrics(&mut rng, today, plan.snapshots))?;
    write_dataset(&plan.out_dir, Dataset::Workflow, &generate_workflow_metrics(&mut rng, today, plan.snapshots))?;

    let total = plan.clients + plan.loans + plan.deals + plan.activities + 3 * plan.snapshots;
    println!("Total: {total} records across 7 files in {}", plan.out_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::remap;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn counts_are_respected() {
        let mut r = rng(1);
        assert_eq!(generate_clients(&mut r, day(), 50).len(), 50);
        assert_eq!(generate_deals(&mut r, day(), 150).len(), 150);
        assert_eq!(generate_workflow_metrics(&mut r, day(), 50).len(), 50);
    }

    #[test]
    fn same_seed_same_data() {
        let a = generate_loans(&mut rng(42), day(), 20);
        let b = generate_loans(&mut rng(42), day(), 20);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn client_ids_are_unique_even_past_the_company_table() {
        let clients = generate_clients(&mut rng(7), day(), 60);
        let mut ids: Vec<&str> = clients.iter().map(|c| c.client_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 60);
    }

    #[test]
    fn generated_statuses_stay_inside_the_remap_vocabulary() {
        let mut r = rng(3);
        for client in generate_clients(&mut r, day(), 30) {
            // The table must recognize the raw value rather than bucket it
            // into the default for everything.
            let target = remap::CLIENT_STATUS.target(&client.client_status);
            assert!(["Active", "Prospect", "Inactive"].contains(&target));
        }
        for activity in generate_activities(&mut r, day(), 30) {
            let target = remap::ACTIVITY_STATUS.target(&activity.activity_status);
            assert_ne!(target, "");
            assert!(!target.contains('_'), "unmapped key {target:?}");
            let type_target = remap::ACTIVITY_TYPE.target(&activity.activity_type);
            assert!(!type_target.contains('_'));
        }
    }

    #[test]
    fn loans_are_on_book_today() {
        for loan in generate_loans(&mut rng(5), day(), 40) {
            let origination =
                NaiveDate::parse_from_str(&loan.origination_date, "%Y-%m-%d").unwrap();
            let maturity = NaiveDate::parse_from_str(&loan.maturity_date, "%Y-%m-%d").unwrap();
            assert!(origination < day(), "{} originates in the future", loan.loan_id);
            assert!(maturity > day(), "{} already matured", loan.loan_id);
        }
    }

    #[test]
    fn snapshot_dates_are_iso_and_distinct() {
        let kpis = generate_performance_kpis(&mut rng(9), day(), 12);
        let mut dates: Vec<&str> = kpis.iter().map(|k| k.report_date.as_str()).collect();
        for date in &dates {
            assert!(NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
        }
        dates.sort();
        dates.dedup();
        assert_eq!(dates.len(), 12);
    }

    #[test]
    fn generated_files_load_and_prepare_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let plan = GeneratePlan {
            out_dir: dir.path().to_path_buf(),
            clients: 5,
            loans: 5,
            deals: 5,
            activities: 5,
            snapshots: 3,
            seed: Some(11),
        };
        run_generate(&plan).unwrap();

        for dataset in catalog::Dataset::ALL {
            let records = catalog::load_records(&dir.path().join(dataset.file_name())).unwrap();
            assert!(!records.is_empty(), "{} came out empty", dataset.key());
            for record in &records {
                let prepared = catalog::prepare(dataset, record).unwrap();
                assert!(prepared.contains_key("externalReferenceCode"));
            }
        }
    }
}
