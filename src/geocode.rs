use std::thread;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::db::{CityRow, GeocodedRow};
use crate::error::{PipelineError, PipelineResult};

const OPENCAGE_URL: &str = "https://api.opencagedata.com/geocode/v1/json";
const SERVICE: &str = "OpenCage";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One match returned by a forward geocoding lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub country_code: Option<String>,
    pub coordinates: Coordinates,
}

pub trait Geocoder {
    /// Candidates for a free-text query, best match first.
    fn geocode(&self, query: &str) -> PipelineResult<Vec<Candidate>>;
}

pub struct OpenCageClient {
    client: Client,
    api_key: String,
}

impl OpenCageClient {
    pub fn new(api_key: &str) -> PipelineResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("jobs_pipeline/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(OpenCageClient {
            client,
            api_key: api_key.to_string(),
        })
    }
}

impl Geocoder for OpenCageClient {
    fn geocode(&self, query: &str) -> PipelineResult<Vec<Candidate>> {
        let resp = self
            .client
            .get(OPENCAGE_URL)
            .query(&[("q", query), ("key", self.api_key.as_str()), ("no_annotations", "1")])
            .send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Status { service: SERVICE, status });
        }
        parse_candidates(&resp.text()?)
    }
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    #[serde(default)]
    components: Components,
    geometry: Geometry,
}

#[derive(Debug, Default, Deserialize)]
struct Components {
    country_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

impl From<OpenCageResult> for Candidate {
    fn from(r: OpenCageResult) -> Self {
        Candidate {
            country_code: r.components.country_code,
            coordinates: Coordinates {
                lat: r.geometry.lat,
                lon: r.geometry.lng,
            },
        }
    }
}

/// Only the first result must be well formed; malformed trailing results are skipped.
fn parse_candidates(body: &str) -> PipelineResult<Vec<Candidate>> {
    let decode_err = |e: serde_json::Error| PipelineError::Decode {
        service: SERVICE,
        reason: e.to_string(),
    };
    let parsed: OpenCageResponse = serde_json::from_str(body).map_err(decode_err)?;

    let mut results = parsed.results.into_iter();
    let Some(first) = results.next() else {
        return Ok(Vec::new());
    };
    let first: OpenCageResult = serde_json::from_value(first).map_err(decode_err)?;

    let mut candidates = vec![Candidate::from(first)];
    for (i, value) in results.enumerate() {
        match serde_json::from_value::<OpenCageResult>(value) {
            Ok(r) => candidates.push(r.into()),
            Err(e) => debug!("Skipping malformed result {}: {}", i + 2, e),
        }
    }
    Ok(candidates)
}

/// Coordinates for `city` when the first candidate lies in `target_country`.
///
/// Lookup failures and empty results are logged and give `None`.
pub fn geocode_and_filter(geocoder: &dyn Geocoder, city: &str, target_country: &str) -> Option<Coordinates> {
    let candidates = match geocoder.geocode(city) {
        Ok(c) => c,
        Err(e) => {
            warn!("Error geocoding '{}': {}", city, e);
            return None;
        }
    };

    let Some(first) = candidates.into_iter().next() else {
        info!("No result found for '{}'", city);
        return None;
    };

    let code = first.country_code.as_deref().unwrap_or("");
    if code.eq_ignore_ascii_case(target_country) {
        debug!(
            "'{}' accepted | lat={}, lon={}",
            city, first.coordinates.lat, first.coordinates.lon
        );
        Some(first.coordinates)
    } else {
        info!("'{}' not in target country (country_code: {:?})", city, code);
        None
    }
}

/// Geocode every row in order, pausing `delay` between successive lookups.
pub fn add_coordinates(
    rows: &[CityRow],
    geocoder: &dyn Geocoder,
    target_country: &str,
    delay: Duration,
) -> Vec<GeocodedRow> {
    let pb = ProgressBar::new(rows.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
    {
        pb.set_style(style.progress_chars("=> "));
    }

    let total = rows.len();
    let mut out = Vec::with_capacity(total);
    for (i, row) in rows.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }

        let start = Instant::now();
        debug!("Geocoding {}/{}: '{}'", i + 1, total, row.city);
        let coords = geocode_and_filter(geocoder, &row.city, target_country);
        debug!("Time taken: {:.2}s", start.elapsed().as_secs_f64());

        out.push(GeocodedRow {
            id: row.id,
            city: row.city.clone(),
            lat: coords.map(|c| c.lat),
            lon: coords.map(|c| c.lon),
        });
        pb.inc(1);
    }

    pb.finish_and_clear();
    let accepted = out.iter().filter(|r| r.lat.is_some()).count();
    info!("Geocoded {} rows ({} accepted)", total, accepted);
    out
}

#[cfg(test)]
pub mod mock {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// Canned candidates per query; unknown queries fail like a network error.
    #[derive(Default)]
    pub struct MockGeocoder {
        pub responses: HashMap<String, Vec<Candidate>>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MockGeocoder {
        pub fn with(mut self, query: &str, country: &str, lat: f64, lon: f64) -> Self {
            self.responses.entry(query.to_string()).or_default().push(Candidate {
                country_code: Some(country.to_string()),
                coordinates: Coordinates { lat, lon },
            });
            self
        }

        pub fn empty_for(mut self, query: &str) -> Self {
            self.responses.insert(query.to_string(), Vec::new());
            self
        }
    }

    impl Geocoder for MockGeocoder {
        fn geocode(&self, query: &str) -> PipelineResult<Vec<Candidate>> {
            self.calls.borrow_mut().push(query.to_string());
            self.responses.get(query).cloned().ok_or_else(|| PipelineError::Decode {
                service: "mock",
                reason: format!("no canned response for {}", query),
            })
        }
    }
}
