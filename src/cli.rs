// Command-line surface. One binary replaces the pile of one-off seeding
// scripts this tool grew out of: `generate` makes the dataset files,
// `picklists` and `objects` provision the schema, `upload` pushes the
// records. Dispatch returns the process exit code instead of calling
// `exit` itself so `main` stays in control of teardown.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use crate::api::ApiClient;
use crate::catalog::Dataset;
use crate::config::Config;
use crate::generate::{self, GeneratePlan};
use crate::objects::{self, ObjectPlan};
use crate::picklists;
use crate::report::RunReport;
use crate::ui;
use crate::upload::{self, BatchOptions, UploadPlan};

#[derive(Debug, Parser)]
#[command(
    name = "maestro-seed",
    version,
    about = "Provision and seed a Maestro GFD instance over its admin REST API"
)]
pub struct Cli {
    /// Target instance base URL.
    #[arg(long, env = "MAESTRO_BASE_URL", global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate the synthetic dataset files
    Generate(GenerateArgs),
    /// Transform and upload record datasets
    Upload(UploadArgs),
    /// Provision or inspect picklist definitions
    Picklists {
        #[command(subcommand)]
        command: PicklistCommand,
    },
    /// Create object definitions
    Objects {
        #[command(subcommand)]
        command: ObjectCommand,
    },
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Directory the dataset files are written to
    #[arg(long, default_value = "data")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 50)]
    pub clients: usize,

    #[arg(long, default_value_t = 50)]
    pub loans: usize,

    #[arg(long, default_value_t = 150)]
    pub deals: usize,

    #[arg(long, default_value_t = 80)]
    pub activities: usize,

    /// Monthly snapshots for each of the three metrics datasets
    #[arg(long, default_value_t = 50)]
    pub snapshots: usize,

    /// Fixed RNG seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Datasets to upload, in the order given
    #[arg(value_enum)]
    pub datasets: Vec<Dataset>,

    /// Upload every dataset, in dependency order
    #[arg(long, conflicts_with = "datasets")]
    pub all: bool,

    /// Directory the dataset files are read from
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Load and transform only; nothing is sent
    #[arg(long)]
    pub dry_run: bool,

    /// Upload at most this many records per dataset
    #[arg(long)]
    pub limit: Option<usize>,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Debug, Subcommand)]
pub enum PicklistCommand {
    /// Create picklist definitions (the built-in set unless --dir is given)
    Upload {
        /// Load definitions from a directory of JSON files instead
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Create each definition empty, then add entries one at a time
        /// with normalized keys
        #[arg(long)]
        two_step: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// List the definitions already on the instance
    Check,
}

#[derive(Debug, Subcommand)]
pub enum ObjectCommand {
    /// Create object definitions from JSON files and publish them
    Create {
        /// Directory holding *.object-definition.json files
        #[arg(long, default_value = "objects")]
        dir: PathBuf,

        /// Leave definitions in draft instead of publishing
        #[arg(long)]
        no_publish: bool,

        /// Create the shared object folder first
        #[arg(long)]
        folder: bool,

        /// Skip the confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Run one parsed invocation and hand back the exit code.
pub fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Generate(args) => {
            let plan = GeneratePlan {
                out_dir: args.out_dir,
                clients: args.clients,
                loans: args.loans,
                deals: args.deals,
                activities: args.activities,
                snapshots: args.snapshots,
                seed: args.seed,
            };
            generate::run_generate(&plan)?;
            Ok(0)
        }

        Command::Upload(args) => {
            let datasets = if args.all {
                Dataset::ALL.to_vec()
            } else if args.datasets.is_empty() {
                bail!("name at least one dataset, or pass --all");
            } else {
                args.datasets.clone()
            };
            let plan = UploadPlan {
                datasets,
                data_dir: args.data_dir,
                limit: args.limit,
            };

            if args.dry_run {
                // No network, no credentials needed, no prompt.
                let report = upload::run_dry(&plan)?;
                report.print_summary();
                return Ok(report.exit_code());
            }

            let config = Config::from_env(cli.base_url)?;
            if !ui::confirm_target(&config.base_url, args.yes)? {
                println!("Aborted.");
                return Ok(1);
            }
            let api = ApiClient::new(config)?;
            let report = upload::run_upload(&api, &plan, &BatchOptions::default())?;
            report.print_summary();
            Ok(report.exit_code())
        }

        Command::Picklists { command } => match command {
            PicklistCommand::Upload { dir, two_step, yes } => {
                let lists = match dir {
                    Some(dir) => picklists::load_picklists_dir(&dir)?,
                    None => picklists::standard_picklists(),
                };
                let config = Config::from_env(cli.base_url)?;
                if !ui::confirm_target(&config.base_url, yes)? {
                    println!("Aborted.");
                    return Ok(1);
                }
                let api = ApiClient::new(config)?;
                let tally =
                    picklists::run_picklist_upload(&api, &lists, two_step, &BatchOptions::default());
                let mut report = RunReport::new();
                report.push(tally);
                report.print_summary();
                Ok(report.exit_code())
            }
            PicklistCommand::Check => {
                let config = Config::from_env(cli.base_url)?;
                let api = ApiClient::new(config)?;
                picklists::run_picklist_check(&api)?;
                Ok(0)
            }
        },

        Command::Objects { command } => match command {
            ObjectCommand::Create {
                dir,
                no_publish,
                folder,
                yes,
            } => {
                let plan = ObjectPlan {
                    dir,
                    publish: !no_publish,
                    folder,
                };
                let config = Config::from_env(cli.base_url)?;
                if !ui::confirm_target(&config.base_url, yes)? {
                    println!("Aborted.");
                    return Ok(1);
                }
                let api = ApiClient::new(config)?;
                let tally = objects::run_object_create(&api, &plan, &BatchOptions::default())?;
                let mut report = RunReport::new();
                report.push(tally);
                report.print_summary();
                Ok(report.exit_code())
            }
        },
    }
}
