//! `aegis claim` — Initiate a claim against an active policy.

use clap::Args;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct ClaimArgs {
    /// The policy to claim against.
    pub policy_id: Uuid,

    /// Base URL of the node API.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub api_url: String,
}

pub async fn run(args: &ClaimArgs) -> anyhow::Result<()> {
    let url = format!("{}/claims", args.api_url);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "policy_id": args.policy_id }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!("claim failed ({status}): {body}");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
