// API client module: a small blocking HTTP client for the two map web
// services the picker needs, the IP geolocation endpoint and the places
// text search endpoint. Everything is synchronous; one request at a time.

use reqwest::blocking::Client;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{PickerError, Result};
use crate::key::Credential;

pub const DEFAULT_GEOLOCATION_URL: &str = "https://www.googleapis.com/geolocation/v1/geolocate";
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

pub const DEFAULT_QUERY: &str = "restaurant";
pub const DEFAULT_RADIUS_METERS: u32 = 10_000;

/// Blocking client for the geolocation and place search services.
///
/// Holds the credential so callers load it once and never again.
#[derive(Clone)]
pub struct MapsClient {
    client: Client,
    credential: Credential,
    geolocation_url: Url,
    places_url: Url,
}

/// Latitude/longitude in degrees, passed through from the provider as-is.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

/// One search result. `name` and `place_id` are required; everything
/// else the provider may omit.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceRecord {
    pub name: String,
    pub place_id: String,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub user_ratings_total: Option<u32>,
    pub price_level: Option<u8>,
    pub opening_hours: Option<OpeningHours>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

impl PlaceRecord {
    /// `Some(true)` open, `Some(false)` closed, `None` when the provider
    /// did not say.
    #[must_use]
    pub fn open_now(&self) -> Option<bool> {
        self.opening_hours.as_ref().and_then(|h| h.open_now)
    }
}

/// One page of results in provider ranking order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultPage {
    pub places: Vec<PlaceRecord>,
    /// Present when another page can be fetched.
    pub next_page_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeolocateRequest {
    consider_ip: bool,
}

#[derive(Deserialize)]
struct GeolocateResponse {
    location: Coordinate,
    accuracy: Option<f64>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PlaceRecord>,
    next_page_token: Option<String>,
    status: Option<String>,
    error_message: Option<String>,
}

impl MapsClient {
    /// Create a client pointed at the production endpoints, unless
    /// `RESTAURANT_PICKER_GEOLOCATION_URL` / `RESTAURANT_PICKER_PLACES_URL`
    /// override them.
    pub fn from_env(credential: Credential) -> Result<Self> {
        let geolocation_url = std::env::var("RESTAURANT_PICKER_GEOLOCATION_URL")
            .unwrap_or_else(|_| DEFAULT_GEOLOCATION_URL.into());
        let places_url = std::env::var("RESTAURANT_PICKER_PLACES_URL")
            .unwrap_or_else(|_| DEFAULT_PLACES_URL.into());
        Self::with_endpoints(credential, &geolocation_url, &places_url)
    }

    /// Create a client against explicit endpoints (mock servers in tests).
    pub fn with_endpoints(
        credential: Credential,
        geolocation_url: &str,
        places_url: &str,
    ) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(MapsClient {
            client,
            credential,
            geolocation_url: parse_endpoint(geolocation_url)?,
            places_url: parse_endpoint(places_url)?,
        })
    }

    /// Ask the geolocation service where this machine is, based on its IP.
    ///
    /// The service only accepts POST, so a small JSON body is always sent.
    pub fn request_location(&self) -> Result<Coordinate> {
        tracing::debug!(url = %self.geolocation_url, "requesting geolocation");
        let res = self
            .client
            .post(self.geolocation_url.clone())
            .query(&[("key", self.credential.as_str())])
            .json(&GeolocateRequest { consider_ip: true })
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        let parsed: GeolocateResponse = decode(&body, "geolocation response")?;
        tracing::debug!(
            lat = parsed.location.lat,
            lng = parsed.location.lng,
            accuracy = parsed.accuracy,
            "geolocation resolved"
        );
        Ok(parsed.location)
    }

    /// Text search around `coordinate`.
    pub fn search_nearby(
        &self,
        coordinate: Coordinate,
        query: &str,
        radius_meters: u32,
    ) -> Result<ResultPage> {
        let location = format!("{},{}", coordinate.lat, coordinate.lng);
        let radius = radius_meters.to_string();
        tracing::debug!(%location, query, radius_meters, "searching nearby places");
        self.search(&[
            ("location", location.as_str()),
            ("query", query),
            ("radius", radius.as_str()),
        ])
    }

    /// Fetch the page a previous search pointed at. The provider rejects
    /// any search parameter besides the token on these requests.
    pub fn search_next_page(&self, token: &str) -> Result<ResultPage> {
        tracing::debug!("fetching next result page");
        self.search(&[("pagetoken", token)])
    }

    fn search(&self, params: &[(&str, &str)]) -> Result<ResultPage> {
        let res = self
            .client
            .get(self.places_url.clone())
            .query(params)
            .query(&[("key", self.credential.as_str())])
            .send()?
            .error_for_status()?;
        let body = res.text()?;
        let parsed: SearchResponse = decode(&body, "place search response")?;

        match parsed.status.as_deref() {
            None | Some("OK" | "ZERO_RESULTS") => {}
            Some(status) => {
                return Err(PickerError::ProviderStatus {
                    status: status.to_owned(),
                    message: parsed.error_message,
                })
            }
        }

        tracing::debug!(
            results = parsed.results.len(),
            has_next = parsed.next_page_token.is_some(),
            "place search page received"
        );
        Ok(ResultPage {
            places: parsed.results,
            next_page_token: parsed.next_page_token,
        })
    }
}

fn parse_endpoint(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| PickerError::InvalidEndpoint {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|source| PickerError::MalformedResponse {
        context: context.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn place_without_opening_hours_is_unknown() {
        let place: PlaceRecord = serde_json::from_value(json!({
            "name": "Noodle Bar",
            "place_id": "abc",
        }))
        .unwrap();
        assert_eq!(place.open_now(), None);
        assert_eq!(place.formatted_address, None);
    }

    #[test]
    fn place_reads_nested_open_now() {
        let place: PlaceRecord = serde_json::from_value(json!({
            "name": "Noodle Bar",
            "place_id": "abc",
            "opening_hours": { "open_now": false },
            "rating": 4.5,
            "user_ratings_total": 120,
            "price_level": 2,
        }))
        .unwrap();
        assert_eq!(place.open_now(), Some(false));
        assert_eq!(place.rating, Some(4.5));
        assert_eq!(place.user_ratings_total, Some(120));
        assert_eq!(place.price_level, Some(2));
    }

    #[test]
    fn place_missing_name_is_malformed() {
        let err = decode::<PlaceRecord>(r#"{"place_id":"abc"}"#, "place").unwrap_err();
        assert!(matches!(err, PickerError::MalformedResponse { .. }));
    }

    #[test]
    fn geolocate_body_uses_camel_case() {
        let body = serde_json::to_value(GeolocateRequest { consider_ip: true }).unwrap();
        assert_eq!(body, json!({ "considerIp": true }));
    }
}
