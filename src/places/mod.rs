//! Google Places lookups: text search, photo discovery, and URL builders.
//!
//! The photo proxy endpoint exists so the frontend never sees the API key;
//! everything here that returns a photo URL returns either the proxy path or
//! a keyed upstream URL meant to be fetched server-side.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use crate::errors::Result;
use crate::errors::VibeMatchError;

/// One place from a text search
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResult {
    pub name: String,
    pub formatted_address: Option<String>,
    pub place_id: String,
    #[serde(default)]
    pub photos: Vec<PlacePhoto>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacePhoto {
    pub photo_reference: String,
}

/// A fetched photo ready to stream back to the client
pub struct PhotoBytes {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Client for the Google Places web service
pub struct PlacesService {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl PlacesService {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(20))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.places_endpoint().to_string(),
            api_key: config.places_api_key().to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.endpoint)
            .and_then(|u| u.join(path))
            .map_err(|e| VibeMatchError::Places(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Text search, optionally biased toward a coordinate (10km radius).
    ///
    /// `ZERO_RESULTS` is a valid empty answer, not an error.
    pub async fn text_search(
        &self,
        query: &str,
        location_bias: Option<(f64, f64)>,
    ) -> Result<Vec<PlaceResult>> {
        #[derive(Deserialize)]
        struct SearchResponse {
            status: String,
            #[serde(default)]
            results: Vec<PlaceResult>,
            error_message: Option<String>,
        }

        let mut url = self.url("/maps/api/place/textsearch/json")?;
        url.query_pairs_mut().append_pair("query", query);
        if let Some((lat, lon)) = location_bias {
            url.query_pairs_mut()
                .append_pair("location", &format!("{lat},{lon}"))
                .append_pair("radius", "10000");
        }

        debug!("Places text search: {query}");

        let response: SearchResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| VibeMatchError::Places(format!("Failed to parse response: {e}")))?;

        if response.status != "OK" && response.status != "ZERO_RESULTS" {
            return Err(VibeMatchError::Places(format!(
                "text search error: {} {}",
                response.status,
                response.error_message.unwrap_or_default()
            )));
        }

        Ok(response.results)
    }

    /// Up to `max_photos` keyed photo URLs for the best text-search hit.
    ///
    /// A lookup failure degrades to an empty list; a missing photo is never
    /// worth failing a plan over.
    pub async fn photo_urls_for_place(
        &self,
        place_name: &str,
        location: &str,
        max_photos: usize,
    ) -> Vec<String> {
        match self.lookup_photo_refs(place_name, location, max_photos).await {
            Ok(refs) => refs.iter().map(|r| self.photo_url(r, 800)).collect(),
            Err(e) => {
                warn!("Photo lookup for '{place_name}' failed: {e}");
                Vec::new()
            }
        }
    }

    async fn lookup_photo_refs(
        &self,
        place_name: &str,
        location: &str,
        max_photos: usize,
    ) -> Result<Vec<String>> {
        #[derive(Deserialize)]
        struct DetailsResponse {
            #[serde(default)]
            result: Option<DetailsResult>,
        }

        #[derive(Deserialize)]
        struct DetailsResult {
            #[serde(default)]
            photos: Vec<PlacePhoto>,
        }

        let results = self
            .text_search(&format!("{place_name}, {location}"), None)
            .await?;
        let Some(place_id) = results.first().map(|p| p.place_id.clone()) else {
            return Ok(Vec::new());
        };

        let mut url = self.url("/maps/api/place/details/json")?;
        url.query_pairs_mut()
            .append_pair("place_id", &place_id)
            .append_pair("fields", "photos");

        let details: DetailsResponse = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| VibeMatchError::Places(format!("Failed to parse response: {e}")))?;

        let photos = details.result.map(|r| r.photos).unwrap_or_default();
        Ok(photos
            .into_iter()
            .take(max_photos)
            .map(|p| p.photo_reference)
            .collect())
    }

    /// Fetch the photo bytes behind a reference, for the proxy endpoint.
    pub async fn fetch_photo(&self, photo_ref: &str, maxwidth: u32) -> Result<PhotoBytes> {
        let url = self.photo_url_with_width(photo_ref, maxwidth);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VibeMatchError::Places(format!(
                "photo fetch failed: {}",
                response.status()
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?
            .to_vec();

        Ok(PhotoBytes {
            content_type,
            bytes,
        })
    }

    /// Keyed upstream photo URL at the default width
    #[must_use]
    pub fn photo_url(&self, photo_ref: &str, maxwidth: u32) -> String {
        self.photo_url_with_width(photo_ref, maxwidth)
    }

    fn photo_url_with_width(&self, photo_ref: &str, maxwidth: u32) -> String {
        let mut url = url::Url::parse(&self.endpoint)
            .and_then(|u| u.join("/maps/api/place/photo"))
            .expect("places endpoint is a valid base url");
        url.query_pairs_mut()
            .append_pair("maxwidth", &maxwidth.to_string())
            .append_pair("photo_reference", photo_ref)
            .append_pair("key", &self.api_key);
        url.to_string()
    }
}

/// Keyless proxy path the frontend can embed directly
#[must_use]
pub fn photo_proxy_url(photo_ref: &str, maxwidth: u32) -> String {
    let encoded: String =
        url::form_urlencoded::byte_serialize(photo_ref.as_bytes()).collect();
    format!("/api/place-photo?ref={encoded}&maxwidth={maxwidth}")
}

/// Maps link for a place id, or a search link for a free-text name
#[must_use]
pub fn maps_place_link(place_id_or_query: &str) -> String {
    if place_id_or_query.starts_with("ChIJ") {
        format!("https://www.google.com/maps/place/?q=place_id:{place_id_or_query}")
    } else {
        let encoded: String =
            url::form_urlencoded::byte_serialize(place_id_or_query.as_bytes()).collect();
        format!("https://www.google.com/maps/search/?api=1&query={encoded}")
    }
}

/// Maps search link for a named place in a location, with `+`-joined terms
#[must_use]
pub fn maps_search_url(place_name: &str, location: &str) -> String {
    let query = format!("{place_name} {location}")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("+");
    format!("https://www.google.com/maps/search/?api=1&query={query}")
}

/// Maps link pinned to a specific resolved place
#[must_use]
pub fn maps_result_url(name: &str, place_id: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(name.as_bytes()).collect();
    format!("https://www.google.com/maps/search/?api=1&query={encoded}&query_place_id={place_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_photo_proxy_url_encodes_reference() {
        let url = photo_proxy_url("abc/def+g", 800);
        assert_eq!(url, "/api/place-photo?ref=abc%2Fdef%2Bg&maxwidth=800");
    }

    #[test]
    fn test_maps_place_link_detects_place_ids() {
        assert_eq!(
            maps_place_link("ChIJd8BlQ2BZwokRAFUEcm_qrcA"),
            "https://www.google.com/maps/place/?q=place_id:ChIJd8BlQ2BZwokRAFUEcm_qrcA"
        );
        assert_eq!(
            maps_place_link("cozy cafe"),
            "https://www.google.com/maps/search/?api=1&query=cozy+cafe"
        );
    }

    #[test]
    fn test_maps_search_url_joins_terms() {
        assert_eq!(
            maps_search_url("Lincoln Park Zoo", "Chicago, IL"),
            "https://www.google.com/maps/search/?api=1&query=Lincoln+Park+Zoo+Chicago,+IL"
        );
    }

    #[test]
    fn test_maps_result_url_pins_place_id() {
        let url = maps_result_url("The Violet Hour", "ChIJabc123");
        assert!(url.contains("query=The+Violet+Hour"));
        assert!(url.ends_with("&query_place_id=ChIJabc123"));
    }
}
