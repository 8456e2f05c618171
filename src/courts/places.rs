//! Google Places client.
//!
//! Two calls: nearby search (keyword "pickleball court", paginated via
//! `next_page_token`, which Google activates a couple of seconds after
//! issuing) and place details. The base URL is injectable so tests can
//! point the client at a mock server.

use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const SEARCH_KEYWORD: &str = "pickleball court";

/// Google needs a moment before a fresh page token becomes valid.
const PAGE_TOKEN_DELAY: Duration = Duration::from_secs(2);

pub const DEFAULT_RADIUS_METERS: u32 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct NearbyResponse {
    #[serde(default)]
    results: Vec<Place>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<Place>,
}

#[derive(Clone)]
pub struct PlacesClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PlacesClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        PlacesClient {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.into(),
        }
    }

    /// Nearby search, following `next_page_token` until exhausted.
    pub async fn nearby_courts(
        &self,
        latitude: f64,
        longitude: f64,
        radius_meters: u32,
    ) -> Result<Vec<Place>, reqwest::Error> {
        let mut courts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut params = vec![
                ("location", format!("{latitude},{longitude}")),
                ("radius", radius_meters.to_string()),
                ("keyword", SEARCH_KEYWORD.to_string()),
                ("key", self.api_key.clone()),
            ];
            if let Some(token) = &page_token {
                params.push(("pagetoken", token.clone()));
            }

            let response: NearbyResponse = self
                .http
                .get(format!("{}/nearbysearch/json", self.base_url))
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            courts.extend(response.results);

            match response.next_page_token {
                Some(token) => {
                    page_token = Some(token);
                    tokio::time::sleep(PAGE_TOKEN_DELAY).await;
                }
                None => break,
            }
        }

        Ok(courts)
    }

    /// Place details; `None` when Google has no result for the id.
    pub async fn place_details(
        &self,
        place_id: &str,
    ) -> Result<Option<Place>, reqwest::Error> {
        let response: DetailsResponse = self
            .http
            .get(format!("{}/details/json", self.base_url))
            .query(&[("place_id", place_id), ("key", &self.api_key)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn nearby_search_single_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("keyword", "pickleball court"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {"place_id": "abc", "name": "Central Park Courts"},
                    {"place_id": "def", "name": "Riverside Courts"}
                ]
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::with_base_url("test-key".to_string(), server.uri());
        let courts = client.nearby_courts(40.78, -73.96, 10_000).await.unwrap();

        assert_eq!(courts.len(), 2);
        assert_eq!(courts[0].place_id, "abc");
        assert_eq!(courts[1].name, "Riverside Courts");
    }

    #[tokio::test]
    async fn nearby_search_follows_page_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .and(query_param("pagetoken", "token-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"place_id": "page2", "name": "Second Page Courts"}]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"place_id": "page1", "name": "First Page Courts"}],
                "next_page_token": "token-2"
            })))
            .mount(&server)
            .await;

        let client = PlacesClient::with_base_url("test-key".to_string(), server.uri());
        let courts = client.nearby_courts(40.78, -73.96, 10_000).await.unwrap();

        assert_eq!(courts.len(), 2);
        assert_eq!(courts[0].place_id, "page1");
        assert_eq!(courts[1].place_id, "page2");
    }

    #[tokio::test]
    async fn details_found_and_missing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/details/json"))
            .and(query_param("place_id", "abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "result": {
                    "place_id": "abc",
                    "name": "Central Park Courts",
                    "geometry": {"location": {"lat": 40.78, "lng": -73.96}}
                }
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/details/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = PlacesClient::with_base_url("test-key".to_string(), server.uri());

        let found = client.place_details("abc").await.unwrap().unwrap();
        assert_eq!(found.name, "Central Park Courts");
        let location = found.geometry.unwrap().location;
        assert!((location.lat - 40.78).abs() < f64::EPSILON);

        let missing = client.place_details("nope").await.unwrap();
        assert!(missing.is_none());
    }
}
