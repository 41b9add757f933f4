//! Implementation of the `proofloop init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::fs;

const STARTER_CONFIG: &str = r#"# proofloop configuration.
# Values here are overridden by .proofloop/local.yaml and then by
# PROOFLOOP_* environment variables (double underscore nests sections,
# e.g. PROOFLOOP_LOGIN__MAX_RETRIES=2).

app:
  url: https://app.grammarly.com
  login_url: https://www.grammarly.com/signin
  profile: proofloop

login:
  max_retries: 1
  base_backoff_ms: 2000
  max_backoff_ms: 30000
  settle_delay_ms: 1500

automation:
  base_url: http://127.0.0.1:4800
  # api_key: set PROOFLOOP_AUTOMATION__API_KEY instead of writing it here
  timeout_secs: 120

# Uncomment to enable auto-login. Without this section an unauthenticated
# session fails fast with the live-session debug URL.
# onepassword:
#   connect_url: http://127.0.0.1:8080
#   # token: set PROOFLOOP_ONEPASSWORD__TOKEN
#   username_ref: Private/Grammarly/username
#   password_ref: Private/Grammarly/password

rewriter:
  base_url: https://api.anthropic.com
  # api_key: set PROOFLOOP_REWRITER__API_KEY

logging:
  level: info
  format: pretty

server:
  port: 4876
"#;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let dir = args.path.join(".proofloop");
    let config_path = dir.join("config.yaml");

    if config_path.exists() && !args.force {
        let message = format!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
        if json_mode {
            println!("{}", serde_json::json!({ "success": false, "message": message }));
        } else {
            println!("{message}");
        }
        return Ok(());
    }

    fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    fs::write(&config_path, STARTER_CONFIG)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    if json_mode {
        println!(
            "{}",
            serde_json::json!({
                "success": true,
                "config_path": config_path.display().to_string(),
            })
        );
    } else {
        println!("Wrote starter config to {}", config_path.display());
    }
    Ok(())
}
