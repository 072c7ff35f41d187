//! `aegis status` — Query the status of a running node.

use clap::Args;

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Base URL of the node API.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub api_url: String,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let url = format!("{}/status", args.api_url);
    let response: serde_json::Value = reqwest::get(&url).await?.json().await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
