//! Open-Meteo forecast client and best-hangout-day scoring.

use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::Result;
use crate::errors::VibeMatchError;

/// One day of forecast, reduced to what the scoring needs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyForecast {
    pub date: String,
    pub tmin: f64,
    pub tmax: f64,
    /// Max precipitation probability for the day, percent
    pub pop: Option<f64>,
}

/// The suggested day and whether to plan indoors
#[derive(Debug, Clone, Serialize)]
pub struct BestDay {
    pub best: DailyForecast,
    pub score: f64,
    pub indoor_recommended: bool,
}

/// Client for the Open-Meteo daily forecast endpoint
pub struct WeatherService {
    endpoint: String,
    client: Client,
}

impl WeatherService {
    pub fn new(config: &crate::config::AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        Ok(Self {
            endpoint: config.weather_endpoint().to_string(),
            client,
        })
    }

    /// Fetch the 7-day daily forecast for a coordinate
    pub async fn seven_day(&self, lat: f64, lon: f64) -> Result<Vec<DailyForecast>> {
        #[derive(Deserialize, Default)]
        struct DailyBlock {
            #[serde(default)]
            time: Vec<String>,
            #[serde(default)]
            temperature_2m_max: Vec<f64>,
            #[serde(default)]
            temperature_2m_min: Vec<f64>,
            #[serde(default)]
            precipitation_probability_max: Vec<Option<f64>>,
        }

        #[derive(Deserialize)]
        struct ForecastResponse {
            #[serde(default)]
            daily: Option<DailyBlock>,
        }

        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| VibeMatchError::Weather(e.to_string()))?
            .join("/v1/forecast")
            .map_err(|e| VibeMatchError::Weather(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("latitude", &lat.to_string())
            .append_pair("longitude", &lon.to_string())
            .append_pair(
                "daily",
                "temperature_2m_max,temperature_2m_min,precipitation_probability_max",
            )
            .append_pair("timezone", "auto");

        debug!("Fetching 7-day forecast for ({lat}, {lon})");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| VibeMatchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(VibeMatchError::Weather(format!(
                "Open-Meteo error: {}",
                response.status()
            )));
        }

        let forecast: ForecastResponse = response
            .json()
            .await
            .map_err(|e| VibeMatchError::Weather(format!("Failed to parse response: {e}")))?;

        let daily = forecast.daily.unwrap_or_default();
        let days = daily
            .time
            .into_iter()
            .enumerate()
            .map(|(i, date)| DailyForecast {
                date,
                tmax: daily.temperature_2m_max.get(i).copied().unwrap_or(0.0),
                tmin: daily.temperature_2m_min.get(i).copied().unwrap_or(0.0),
                pop: daily
                    .precipitation_probability_max
                    .get(i)
                    .copied()
                    .flatten(),
            })
            .collect();

        Ok(days)
    }
}

/// Score one day: 1.0 at a 22°C midpoint falling linearly to 0 at ±12°C,
/// minus up to 0.8 for rain probability.
fn day_score(day: &DailyForecast) -> f64 {
    let mid = (day.tmax + day.tmin) / 2.0;
    let temp_ideal = 1.0 - ((mid - 22.0).abs() / 12.0).min(1.0);
    let rain_penalty = day.pop.map_or(0.0, |p| p / 100.0) * 0.8;
    (temp_ideal - rain_penalty).max(0.0)
}

/// Pick the best hangout day out of a forecast window.
///
/// Indoors is recommended when the winning day is cold (below 7°C max) or
/// likely wet (50% rain probability or more). Returns `None` for an empty
/// forecast.
#[must_use]
pub fn suggest_best_day(days: &[DailyForecast]) -> Option<BestDay> {
    let mut best: Option<(&DailyForecast, f64)> = None;
    for day in days {
        let score = day_score(day);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((day, score));
        }
    }

    best.map(|(day, score)| BestDay {
        indoor_recommended: day.tmax < 7.0 || day.pop.is_some_and(|p| p >= 50.0),
        best: day.clone(),
        score,
    })
}
