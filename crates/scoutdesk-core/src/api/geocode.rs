//! Reverse geocoding against a Nominatim-compatible service.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

const GEOCODE_TIMEOUT_SECS: u64 = 10;

/// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("scoutdesk/", env!("CARGO_PKG_VERSION"), " (scout group admin)");

/// Number of comma-separated components kept from `display_name`.
const LABEL_PARTS: usize = 3;

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Clone)]
pub struct GeocodeClient {
    client: Client,
    base_url: String,
}

impl GeocodeClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(GEOCODE_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Short place label for a coordinate, `None` when nothing is there.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
            ])
            .send()
            .await
            .context("Failed to reach geocoding service")?
            .error_for_status()
            .context("Geocoding service returned an error")?;

        let body: ReverseResponse = response
            .json()
            .await
            .context("Failed to parse geocoding response")?;
        let label = body.display_name.as_deref().and_then(short_label);
        debug!(lat, lon, label = ?label, "Reverse geocoded");
        Ok(label)
    }
}

/// First few components of a Nominatim `display_name`.
pub fn short_label(display_name: &str) -> Option<String> {
    let parts: Vec<&str> = display_name
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .take(LABEL_PARTS)
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_label_keeps_three_parts() {
        let name = "Playa Pulpos, Lurín, Lima, Lima Metropolitana, 15841, Perú";
        assert_eq!(short_label(name).as_deref(), Some("Playa Pulpos, Lurín, Lima"));
    }

    #[test]
    fn test_short_label_short_and_empty() {
        assert_eq!(short_label("Huampaní").as_deref(), Some("Huampaní"));
        assert_eq!(short_label(" , "), None);
        assert_eq!(short_label(""), None);
    }
}
