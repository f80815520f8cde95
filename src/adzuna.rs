use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::db::JobRecord;
use crate::error::{PipelineError, PipelineResult};
use crate::settings::Settings;

const SEARCH_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const SERVICE: &str = "Adzuna";

/// A paged source of job listings.
pub trait JobSource {
    fn fetch_page(&self, page: u32, max_days_old: Option<u32>) -> PipelineResult<Vec<JobRecord>>;
}

pub struct AdzunaClient {
    client: Client,
    country: String,
    app_id: String,
    app_key: String,
    search_term: String,
    results_per_page: u32,
}

impl AdzunaClient {
    pub fn new(settings: &Settings) -> PipelineResult<Self> {
        let creds = settings.adzuna_credentials()?;
        let client = Client::builder()
            .user_agent(concat!("jobs_pipeline/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(AdzunaClient {
            client,
            country: settings.adzuna_country.clone(),
            app_id: creds.app_id.to_string(),
            app_key: creds.app_key.to_string(),
            search_term: settings.search_term.clone(),
            results_per_page: settings.results_per_page,
        })
    }
}

impl JobSource for AdzunaClient {
    fn fetch_page(&self, page: u32, max_days_old: Option<u32>) -> PipelineResult<Vec<JobRecord>> {
        let url = format!("{}/{}/search/{}", SEARCH_URL, self.country, page);
        let mut params = vec![
            ("app_id", self.app_id.clone()),
            ("app_key", self.app_key.clone()),
            ("results_per_page", self.results_per_page.to_string()),
            ("what", self.search_term.clone()),
        ];
        if let Some(days) = max_days_old {
            params.push(("max_days_old", days.to_string()));
        }

        debug!("Fetching search page {} ({:?} days old max)", page, max_days_old);
        let start = Instant::now();
        let resp = self.client.get(&url).query(&params).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::Status { service: SERVICE, status });
        }
        let body = resp.text()?;
        let jobs = parse_results(&body)?;
        info!(
            "Search page {} fetched - duration={:.2}s, jobs={}",
            page,
            start.elapsed().as_secs_f32(),
            jobs.len()
        );
        Ok(jobs)
    }
}

// ── Response shapes ──

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<ApiJob>,
}

#[derive(Debug, Deserialize)]
struct ApiJob {
    id: Option<ApiId>,
    title: Option<String>,
    description: Option<String>,
    company: Option<DisplayName>,
    location: Option<DisplayName>,
    salary_min: Option<f64>,
    salary_max: Option<f64>,
    redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Int(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct DisplayName {
    display_name: Option<String>,
}

fn trimmed(v: Option<String>) -> String {
    v.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn display_name(v: Option<DisplayName>) -> String {
    trimmed(v.and_then(|d| d.display_name))
}

/// Shape a search response body into job records.
/// Listings without a numeric id are skipped.
pub fn parse_results(body: &str) -> PipelineResult<Vec<JobRecord>> {
    let parsed: SearchResponse = serde_json::from_str(body).map_err(|e| PipelineError::Decode {
        service: SERVICE,
        reason: e.to_string(),
    })?;

    let jobs = parsed
        .results
        .into_iter()
        .filter_map(|job| {
            let id = match job.id {
                Some(ApiId::Int(n)) => n,
                Some(ApiId::Text(s)) => match s.trim().parse() {
                    Ok(n) => n,
                    Err(_) => {
                        warn!("Skipping listing with non-numeric id {:?}", s);
                        return None;
                    }
                },
                None => {
                    warn!("Skipping listing without id");
                    return None;
                }
            };
            Some(JobRecord {
                id,
                title: trimmed(job.title),
                description: trimmed(job.description),
                company: display_name(job.company),
                location: display_name(job.location),
                salary_min: job.salary_min,
                salary_max: job.salary_max,
                redirect_url: trimmed(job.redirect_url),
            })
        })
        .collect();
    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_fields() {
        let body = r#"{
            "count": 2,
            "results": [
                {
                    "id": "4790123456",
                    "title": "Data Engineer",
                    "description": "  Build pipelines with Spark…  ",
                    "company": {"display_name": " Acme Ltd "},
                    "location": {"display_name": "Leeds, West Yorkshire", "area": ["UK", "Yorkshire"]},
                    "salary_min": 45000,
                    "salary_max": 60000.5,
                    "redirect_url": "https://www.adzuna.co.uk/jobs/land/ad/4790123456"
                },
                {
                    "id": 17,
                    "title": "Analytics Engineer",
                    "location": {"display_name": "UK"}
                }
            ]
        }"#;
        let jobs = parse_results(body).unwrap();
        assert_eq!(jobs.len(), 2);

        let first = &jobs[0];
        assert_eq!(first.id, 4_790_123_456);
        assert_eq!(first.company, "Acme Ltd");
        assert_eq!(first.description, "Build pipelines with Spark…");
        assert_eq!(first.location, "Leeds, West Yorkshire");
        assert_eq!(first.salary_min, Some(45000.0));
        assert_eq!(first.salary_max, Some(60000.5));

        let second = &jobs[1];
        assert_eq!(second.id, 17);
        assert_eq!(second.company, "");
        assert_eq!(second.salary_min, None);
        assert_eq!(second.redirect_url, "");
    }

    #[test]
    fn skips_listings_without_numeric_id() {
        let body = r#"{"results": [{"id": "abc"}, {"title": "no id"}, {"id": "5"}]}"#;
        let jobs = parse_results(body).unwrap();
        assert_eq!(jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn missing_results_is_empty() {
        assert!(parse_results(r#"{"count": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn malformed_body_is_decode_error() {
        assert!(matches!(
            parse_results("<html>rate limited</html>"),
            Err(PipelineError::Decode { .. })
        ));
    }

    #[test]
    fn client_requires_credentials() {
        let settings = Settings::default();
        assert!(matches!(
            AdzunaClient::new(&settings),
            Err(PipelineError::Config(_))
        ));
    }
}
