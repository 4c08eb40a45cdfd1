//! Originate a provider call whose media streams back to this service.
//!
//! The call instructions connect the media stream to `/media-stream` on the
//! configured webhook base URL, and lifecycle updates are posted to
//! `/status`. Provider credentials come from the environment (or `.env`):
//! `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN`, `TWILIO_PHONE_NUMBER`,
//! `WEBHOOK_BASE_URL`.

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dial", about = "Originate a call with live transcription")]
struct Args {
    /// Destination phone number in E.164 format, e.g. +15551234567
    phone_number: String,
}

#[derive(Debug, Deserialize)]
struct CallCreated {
    sid: String,
    status: String,
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{} is not set (check your .env file)", name))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let account_sid = require_env("TWILIO_ACCOUNT_SID")?;
    let auth_token = require_env("TWILIO_AUTH_TOKEN")?;
    let from_number = require_env("TWILIO_PHONE_NUMBER")?;
    let webhook_base_url = require_env("WEBHOOK_BASE_URL")?;
    let webhook_base_url = webhook_base_url.trim_end_matches('/').to_string();

    let host = webhook_base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");

    let twiml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Response>
  <Say>Hello! This is a test call with real-time transcription. Please speak now.</Say>
  <Connect>
    <Stream url="wss://{host}/media-stream" />
  </Connect>
  <Say>Thank you for testing. Goodbye!</Say>
</Response>"#
    );

    let status_callback = format!("{}/status", webhook_base_url);
    let params = [
        ("To", args.phone_number.as_str()),
        ("From", from_number.as_str()),
        ("Twiml", twiml.as_str()),
        ("StatusCallback", status_callback.as_str()),
        ("StatusCallbackEvent", "initiated"),
        ("StatusCallbackEvent", "ringing"),
        ("StatusCallbackEvent", "answered"),
        ("StatusCallbackEvent", "completed"),
    ];

    info!("initiating call to {}", args.phone_number);

    let url = format!(
        "https://api.twilio.com/2010-04-01/Accounts/{}/Calls.json",
        account_sid
    );
    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .basic_auth(&account_sid, Some(&auth_token))
        .form(&params)
        .send()
        .await
        .context("provider API request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        bail!("provider rejected the call ({}): {}", status, body);
    }

    let call: CallCreated = response
        .json()
        .await
        .context("unexpected provider response")?;

    info!("call initiated: sid {}, status {}", call.sid, call.status);
    info!(
        "watch the dashboard at {} for live transcripts",
        webhook_base_url
    );

    Ok(())
}
