//! IAM token exchange
//!
//! Trades a long-lived OAuth token for a short-lived IAM token that the
//! Datasphere and operation services accept as a Bearer credential.

use crate::error::{DatasphereError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest<'a> {
    yandex_passport_oauth_token: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    iam_token: Option<String>,
}

/// Exchange an OAuth token for an IAM token
pub async fn exchange_oauth_token(
    client: &reqwest::Client,
    iam_base: &str,
    oauth_token: &str,
) -> Result<String> {
    let url = format!("{}/iam/v1/tokens", iam_base.trim_end_matches('/'));

    tracing::debug!("Requesting IAM token from {}", url);

    let response = client
        .post(&url)
        .json(&TokenRequest {
            yandex_passport_oauth_token: oauth_token,
        })
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(DatasphereError::TokenExchange {
            status: status.as_u16(),
            body,
        });
    }

    parse_token_response(&body)
}

fn parse_token_response(body: &str) -> Result<String> {
    let parsed: TokenResponse = serde_json::from_str(body)?;
    parsed
        .iam_token
        .filter(|token| !token.is_empty())
        .ok_or(DatasphereError::MissingIamToken)
}
