use std::time::Duration;

use anyhow::{Context, Result, bail};

use nutrilog_core::Error;
use nutrilog_core::models::{FoodDetails, FoodSearchResult};
use nutrilog_core::service::FoodLookupProvider;
use nutrilog_core::usda::{
    FdcFood, SEARCH_PAGE_SIZE, SearchResponse, UsdaConfig, food_to_details, food_to_search_result,
};

pub struct UsdaClient {
    client: reqwest::Client,
    config: UsdaConfig,
    rt: tokio::runtime::Runtime,
}

impl UsdaClient {
    pub fn new(config: UsdaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!(
                "nutrilog-cli/{} (nutrition tracker)",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .context("Failed to build HTTP client")?;
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime")?;
        Ok(Self { client, config, rt })
    }

    pub async fn search_async(&self, query: &str) -> Result<Vec<FoodSearchResult>> {
        let page_size = SEARCH_PAGE_SIZE.to_string();
        let resp = self
            .client
            .get(self.config.search_url())
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("query", query),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .context("Failed to reach FoodData Central")?
            .error_for_status()
            .context("FoodData Central rejected the search")?;

        let data: SearchResponse = resp
            .json()
            .await
            .context("Failed to parse FoodData Central search response")?;

        tracing::debug!(query, hits = data.foods.len(), "food search");
        Ok(data.foods.into_iter().map(food_to_search_result).collect())
    }

    pub async fn details_async(&self, fdc_id: &str) -> Result<FoodDetails> {
        validate_fdc_id(fdc_id)?;
        let resp = self
            .client
            .get(self.config.food_url(fdc_id))
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await
            .context("Failed to reach FoodData Central")?
            .error_for_status()
            .with_context(|| format!("FoodData Central has no food {fdc_id}"))?;

        let data: FdcFood = resp
            .json()
            .await
            .context("Failed to parse FoodData Central food response")?;

        Ok(food_to_details(data))
    }
}

fn validate_fdc_id(fdc_id: &str) -> Result<()> {
    if fdc_id.is_empty() || !fdc_id.chars().all(|c| c.is_ascii_digit()) {
        bail!("Invalid FoodData Central id '{fdc_id}'. Expected a number like 171688");
    }
    Ok(())
}

fn lookup_failed(e: &anyhow::Error) -> Error {
    Error::LookupFailed(format!("{e:#}"))
}

impl FoodLookupProvider for UsdaClient {
    fn search_foods(&self, query: &str) -> nutrilog_core::Result<Vec<FoodSearchResult>> {
        self.rt
            .block_on(self.search_async(query))
            .map_err(|e| lookup_failed(&e))
    }

    fn get_food_details(&self, id: &str) -> nutrilog_core::Result<FoodDetails> {
        self.rt
            .block_on(self.details_async(id))
            .map_err(|e| lookup_failed(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_fdc_id() {
        assert!(validate_fdc_id("171688").is_ok());
        assert!(validate_fdc_id("").is_err());
        assert!(validate_fdc_id("17a").is_err());
        assert!(validate_fdc_id("../foods").is_err());
    }

    #[test]
    fn test_invalid_id_fails_without_network() {
        let client = UsdaClient::new(UsdaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..UsdaConfig::default()
        })
        .unwrap();
        let err = client.get_food_details("not-a-number").unwrap_err();
        match err {
            Error::LookupFailed(msg) => assert!(msg.contains("Invalid FoodData Central id")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unreachable_server_is_lookup_failure() {
        let client = UsdaClient::new(UsdaConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..UsdaConfig::default()
        })
        .unwrap();
        assert!(matches!(
            client.search_foods("apple"),
            Err(Error::LookupFailed(_))
        ));
    }

    // --- Integration tests (hit real FoodData Central API) ---

    #[test]
    #[ignore = "hits FoodData Central API"]
    fn test_search_returns_results() {
        let client = UsdaClient::new(UsdaConfig::default()).unwrap();
        let results = client.search_foods("apple").unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= SEARCH_PAGE_SIZE as usize);
        for food in &results {
            assert!(!food.name.is_empty());
            assert!(food.serving_size > 0.0);
        }
    }

    #[test]
    #[ignore = "hits FoodData Central API"]
    fn test_details_known_food() {
        let client = UsdaClient::new(UsdaConfig::default()).unwrap();
        let food = client.get_food_details("171688").unwrap();
        assert_eq!(food.id, "171688");
        assert!(!food.nutrients.is_empty());
    }
}
