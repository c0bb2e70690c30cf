//! GitHub Actions workflow commands.
//!
//! When running inside Actions, secrets are forwarded to the runner's own
//! log masking and fatal errors are surfaced as `::error::` annotations.

const GITHUB_ACTIONS_VAR: &str = "GITHUB_ACTIONS";

pub fn is_github_actions() -> bool {
    std::env::var(GITHUB_ACTIONS_VAR).is_ok_and(|value| value == "true")
}

/// Ask the runner to mask `secret` in all later log output.
pub fn add_mask(secret: &str) {
    println!("{}", command("add-mask", secret));
}

/// Emit an error annotation.
pub fn error(message: &str) {
    println!("{}", command("error", message));
}

fn command(name: &str, data: &str) -> String {
    format!("::{name}::{}", escape_data(data))
}

fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
