// Runtime configuration: which instance we target and how we authenticate.
// Built once at startup and passed by parameter to every component, so no
// code below `main` reads the environment and nothing is hard-coded.
// Missing credentials fail the run here, before any network call.

use anyhow::{bail, Context, Result};

/// Environment variable for the instance base URL,
/// e.g. `https://webserver-acme-prd.lfr.cloud`. A `--base-url` flag wins.
pub const ENV_BASE_URL: &str = "MAESTRO_BASE_URL";
/// Environment variable for the Basic-Auth user.
pub const ENV_USERNAME: &str = "MAESTRO_USERNAME";
/// Environment variable for the Basic-Auth password.
pub const ENV_PASSWORD: &str = "MAESTRO_PASSWORD";

/// Connection settings for one target instance.
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Resolve the full configuration from the environment. `base_url`
    /// comes from the CLI when given, otherwise from `MAESTRO_BASE_URL`.
    pub fn from_env(base_url: Option<String>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => std::env::var(ENV_BASE_URL)
                .with_context(|| format!("{ENV_BASE_URL} not set and no --base-url given"))?,
        };
        let username = std::env::var(ENV_USERNAME)
            .with_context(|| format!("{ENV_USERNAME} environment variable required"))?;
        let password = std::env::var(ENV_PASSWORD)
            .with_context(|| format!("{ENV_PASSWORD} environment variable required"))?;
        Self::from_parts(base_url, username, password)
    }

    /// Validate and normalize the three settings. Kept separate from
    /// `from_env` so the rules are testable without touching the process
    /// environment.
    pub fn from_parts(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        let username = username.into().trim().to_string();
        let password = password.into();

        if base_url.is_empty() {
            bail!("base URL must not be empty");
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("base URL must start with http:// or https:// (got {base_url:?})");
        }
        if username.is_empty() {
            bail!("username must not be empty");
        }
        if password.is_empty() {
            bail!("password must not be empty");
        }

        Ok(Config {
            base_url,
            username,
            password,
        })
    }

    /// Join an absolute endpoint path onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

// Hand-written so the password never ends up in logs or error chains.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_and_whitespace() {
        let cfg = Config::from_parts(" https://example.lfr.cloud/ ", "admin", "pw").unwrap();
        assert_eq!(cfg.base_url, "https://example.lfr.cloud");
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let cfg = Config::from_parts("https://example.lfr.cloud", "admin", "pw").unwrap();
        assert_eq!(
            cfg.endpoint("/o/c/maestroloans/"),
            "https://example.lfr.cloud/o/c/maestroloans/"
        );
        assert_eq!(
            cfg.endpoint("o/c/maestroloans/"),
            "https://example.lfr.cloud/o/c/maestroloans/"
        );
    }

    #[test]
    fn rejects_missing_pieces() {
        assert!(Config::from_parts("", "admin", "pw").is_err());
        assert!(Config::from_parts("https://x.example", "", "pw").is_err());
        assert!(Config::from_parts("https://x.example", "admin", "").is_err());
    }

    #[test]
    fn missing_environment_fails_fast_naming_the_variable() {
        // Removal only, never set: tests elsewhere that parse CLI flags
        // pass --base-url explicitly, so this cannot race them.
        std::env::remove_var(ENV_BASE_URL);
        std::env::remove_var(ENV_USERNAME);
        std::env::remove_var(ENV_PASSWORD);

        let err = Config::from_env(None).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_BASE_URL));

        // A --base-url on its own is not enough to reach the network.
        let err = Config::from_env(Some("https://x.example".into())).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_USERNAME));
    }

    #[test]
    fn rejects_non_http_url() {
        assert!(Config::from_parts("ftp://x.example", "admin", "pw").is_err());
        assert!(Config::from_parts("x.example", "admin", "pw").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let cfg = Config::from_parts("https://x.example", "admin", "hunter2").unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
