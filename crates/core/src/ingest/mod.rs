pub mod financials;
pub mod news;
pub mod types;

use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn http_client(timeout_secs: Option<u64>) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(Duration::from_secs(
            timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        ))
        .build()
        .context("failed to build data provider http client")
}
