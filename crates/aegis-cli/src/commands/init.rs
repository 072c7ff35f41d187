//! `aegis init` — Initialize a new Aegis node configuration.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("aegis.toml");

    if config_path.exists() {
        anyhow::bail!(
            "configuration file already exists at {}",
            config_path.display()
        );
    }

    std::fs::create_dir_all(&args.dir)?;

    let default_config = r#"# Aegis Node Configuration

name = "aegis-node"
log_level = "info"

[api]
listen_addr = "127.0.0.1"
port = 8080

[transit]
# Upstream status provider base URL. Leave empty for synthetic-only mode.
upstream_url = ""

[verification]
# "mock" simulates a verification network; "real" fails fast until a
# trust-minimized backend is wired in.
mode = "mock"
unavailable_rate = 0.02
tamper_rate = 0.01

[attestation]
min_latency_ms = 1000
max_latency_ms = 2000
"#;

    std::fs::write(&config_path, default_config)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
