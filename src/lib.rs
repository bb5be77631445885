// Library root
// ------------
// This crate exposes the seeding machinery as a library surface; the
// binary (`main.rs`) only parses arguments and dispatches.
//
// Module responsibilities:
// - `config`: target URL and credentials, resolved once from the
//   environment and validated before anything touches the network.
// - `api`: blocking HTTP client for the admin REST APIs, plus the
//   `Outcome` classification every request funnels through.
// - `catalog`: the seven record datasets, their files, endpoints and
//   reference-code derivation.
// - `remap`: categorical value rewriting from source vocabulary to the
//   provisioned picklist keys.
// - `upload`: paced, retrying batch engine and the upload command flow.
// - `picklists` / `objects`: schema provisioning against the list-type
//   and object-admin APIs.
// - `generate`: synthetic dataset files for all of the above.
// - `report`: per-section tallies and the end-of-run summary.
// - `ui`: confirmation prompt and progress widgets.
// - `cli`: the clap command tree and dispatch.
//
// Keeping this separation means the batch engine and the transformations
// are testable without a live instance.
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod generate;
pub mod objects;
pub mod picklists;
pub mod remap;
pub mod report;
pub mod ui;
pub mod upload;
