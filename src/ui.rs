// UI layer: the confirmation gate and progress widgets shared by the
// commands. Kept small and synchronous so the flow is easy to follow.

use anyhow::Result;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

/// Ask before writing to an instance. Seeding is not undoable, so the
/// operator has to look at the target URL once; `--yes` (or any other
/// `assume_yes` source) skips the prompt for scripted runs. Declining is
/// not an error, just a `false`.
pub fn confirm_target(base_url: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(format!("Write to {base_url}?"))
        .default(false)
        .interact()?;
    Ok(answer)
}

/// Progress bar for a record batch of known length.
pub fn batch_bar(len: u64, label: &str) -> ProgressBar {
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}").unwrap(),
    );
    bar.set_message(label.to_string());
    bar
}

/// Spinner for single calls with no meaningful progress, like the
/// read-only picklist check.
pub fn spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message(msg.to_string());
    spinner
}
