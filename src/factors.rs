//! Variation factor fetch client: retrieves news-derived `VariationFactor`s
//! from an external analysis service over HTTP, the same
//! `reqwest::blocking` style as the teacher's race-data fetches in
//! `data.rs` (spec.md §6).

use log::warn;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::models::VariationFactor;

/// Response envelope the analysis service returns.
#[derive(Debug, Deserialize)]
struct FactorEnvelope {
    factors: Vec<serde_json::Value>,
    #[serde(default)]
    source: Option<String>,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<String>,
}

/// Result of one factor fetch: the factors that parsed cleanly, plus the
/// provenance headers/envelope fields the host may want to display.
#[derive(Debug, Clone)]
pub struct FactorFetchResult {
    pub factors: Vec<VariationFactor>,
    pub source: Option<String>,
    pub updated_at: Option<String>,
}

/// Fetch and parse variation factors from `url`. Individual entries that
/// fail to parse are dropped and logged as warnings rather than failing
/// the whole fetch (spec.md §6 "tolerant of malformed entries").
pub fn fetch_factors(client: &Client, url: &str) -> SimResult<FactorFetchResult> {
    let response = client
        .get(url)
        .send()
        .map_err(|e| SimError::ExternalFetch(e.to_string()))?;

    if !response.status().is_success() {
        return Err(SimError::ExternalFetch(format!(
            "factor service responded with status {}",
            response.status()
        )));
    }

    let header_source = response
        .headers()
        .get("X-Analysis-Source")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let header_updated_at = response
        .headers()
        .get("X-Updated-At")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let envelope: FactorEnvelope = response
        .json()
        .map_err(|e| SimError::ExternalFetch(format!("malformed factor envelope: {e}")))?;

    let factors = envelope
        .factors
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<VariationFactor>(raw.clone()) {
            Ok(factor) => Some(factor),
            Err(e) => {
                warn!("dropping malformed variation factor entry: {e}");
                None
            }
        })
        .collect();

    Ok(FactorFetchResult {
        factors,
        source: header_source.or(envelope.source),
        updated_at: header_updated_at.or(envelope.updated_at),
    })
}
