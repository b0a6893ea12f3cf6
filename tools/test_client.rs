//! Test Message Client
//!
//! Generates sample messages and posts them to a running detector for smoke testing.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{info, warn};

const SCAM_OPENERS: &[&str] = &[
    "Congratulations, you won",
    "URGENT: your account has been selected for",
    "Final notice: claim your",
    "You have been chosen to receive",
];

const SCAM_PRIZES: &[&str] = &["$1,000,000", "a free iPhone", "a $500 gift card", "a cash prize"];

const SCAM_CALLS: &[&str] = &[
    "Click here to claim now!",
    "Reply with your bank details to collect.",
    "Call now before the offer expires!",
];

const ORDINARY_MESSAGES: &[&str] = &[
    "Meeting moved to 3pm tomorrow",
    "Can you pick up milk on the way home?",
    "The quarterly report is attached for review",
    "Running ten minutes late, start without me",
    "Happy birthday! Dinner on Saturday?",
    "Your package was delivered to the front desk",
];

/// Subset of the detector's response used for tallies
#[derive(Debug, Deserialize)]
struct Detection {
    result: String,
    prediction_value: i64,
}

/// Message generator for testing
struct MessageGenerator {
    rng: rand::rngs::ThreadRng,
}

impl MessageGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
        }
    }

    /// Generate a promotional scam style message
    fn generate_suspicious(&mut self) -> String {
        format!(
            "{} {}! {}",
            self.random_choice(SCAM_OPENERS),
            self.random_choice(SCAM_PRIZES),
            self.random_choice(SCAM_CALLS)
        )
    }

    /// Generate an ordinary message
    fn generate_ordinary(&mut self) -> String {
        self.random_choice(ORDINARY_MESSAGES).to_string()
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices.choose(&mut self.rng).copied().unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("test_client=info".parse()?),
        )
        .init();

    info!("Starting Test Message Client");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let base_url = args
        .get(1)
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|| "http://localhost:5001".to_string());
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(20);
    let fraud_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.3_f64)
        .clamp(0.0, 1.0);
    let delay_ms: u64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        base_url = %base_url,
        count = count,
        fraud_rate = fraud_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    match client.get(format!("{}/health", base_url)).send().await {
        Ok(response) => {
            let status = response.status();
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            info!(status = %status, body = %body, "Health check");
        }
        Err(e) => {
            warn!(error = %e, "Detector unreachable. Running in dry-run mode.");
            return run_dry_mode(count, fraud_rate, delay_ms).await;
        }
    }

    let mut generator = MessageGenerator::new();
    let mut rng = rand::thread_rng();

    let mut sent_suspicious = 0;
    let mut flagged = 0;
    let mut flagged_suspicious = 0;
    let mut failures = 0;

    for i in 0..count {
        let suspicious = rng.gen_bool(fraud_rate);
        let message = if suspicious {
            sent_suspicious += 1;
            generator.generate_suspicious()
        } else {
            generator.generate_ordinary()
        };

        let response = client
            .post(format!("{}/detect", base_url))
            .json(&json!({ "message": message }))
            .send()
            .await?;

        if response.status().is_success() {
            let detection: Detection = response.json().await?;
            if detection.prediction_value == 1 {
                flagged += 1;
                if suspicious {
                    flagged_suspicious += 1;
                }
            }
            info!(
                message = %message,
                result = %detection.result,
                "Detection"
            );
        } else {
            failures += 1;
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Detection request failed");
        }

        if (i + 1) % 10 == 0 {
            info!("Sent {}/{} messages", i + 1, count);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        sent = count,
        sent_suspicious,
        flagged,
        flagged_suspicious,
        failures,
        "Completed"
    );

    Ok(())
}

async fn run_dry_mode(count: u64, fraud_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no detector connection)");

    let mut generator = MessageGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let message = if rng.gen_bool(fraud_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_ordinary()
        };

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample message {}: {}", i + 1, message);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}
