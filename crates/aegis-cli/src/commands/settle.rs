//! `aegis settle` — Settle a registered booking.

use clap::Args;

#[derive(Args, Debug)]
pub struct SettleArgs {
    /// The booking reference to settle.
    pub booking_id: String,

    /// Base URL of the node API.
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    pub api_url: String,
}

pub async fn run(args: &SettleArgs) -> anyhow::Result<()> {
    let url = format!("{}/settlements", args.api_url);
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .json(&serde_json::json!({ "booking_id": args.booking_id }))
        .send()
        .await?;

    let status = response.status();
    let body: serde_json::Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!("settlement failed ({status}): {body}");
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}
