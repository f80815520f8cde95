use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{PipelineError, PipelineResult};
use crate::location::CityMap;
use crate::resources;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_NAME: &str = "jobs_pipeline";
pub const ENV_PREFIX: &str = "JOBS";

/// How vocabularies are matched against a token stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Whole single tokens only; multi-word terms never match.
    Single,
    /// Raw substring scan over the space-joined tokens.
    #[default]
    Substring,
    /// Longest phrase first over token windows; never crosses a token boundary.
    Token,
}

/// Run configuration, built once in `main` and passed by reference.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,

    pub adzuna_app_id: Option<String>,
    pub adzuna_api_key: Option<String>,
    pub adzuna_country: String,
    pub search_term: String,
    pub results_per_page: u32,
    pub pages: u32,

    pub geocoding_api_key: Option<String>,
    pub target_country_code: String,
    pub geocode_delay_ms: u64,

    pub match_mode: MatchMode,
    pub top_words: usize,

    pub city_map: HashMap<String, String>,
    pub technologies: Vec<String>,
    pub soft_skills: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/jobs.sqlite"),
            adzuna_app_id: None,
            adzuna_api_key: None,
            adzuna_country: "gb".to_string(),
            search_term: "Data Engineer".to_string(),
            results_per_page: 50,
            pages: 10,
            geocoding_api_key: None,
            target_country_code: "gb".to_string(),
            geocode_delay_ms: 500,
            match_mode: MatchMode::default(),
            top_words: 10,
            city_map: resources::CITY_MAP
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            technologies: resources::TECHNOLOGIES.iter().map(|s| s.to_string()).collect(),
            soft_skills: resources::SOFT_SKILLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct AdzunaCredentials<'a> {
    pub app_id: &'a str,
    pub app_key: &'a str,
}

impl Settings {
    /// Layer the optional TOML file under `JOBS_*` environment variables.
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> PipelineResult<Self> {
        Self::load_with(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Values stay strings until deserialization so credentials such as a
    /// zero-padded app id survive; numeric fields are converted by `config`.
    fn load_with(path: Option<&Path>, env: Environment) -> PipelineResult<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.city_map.keys().all(|k| k.trim().is_empty()) {
            return Err(PipelineError::Config("city map is empty".into()));
        }
        if self.technologies.is_empty() {
            return Err(PipelineError::Config("technology vocabulary is empty".into()));
        }
        if self.soft_skills.is_empty() {
            return Err(PipelineError::Config("soft-skill vocabulary is empty".into()));
        }
        let code = self.target_country_code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PipelineError::Config(format!(
                "target_country_code must be a two-letter code, got {:?}",
                self.target_country_code
            )));
        }
        if self.results_per_page == 0 {
            return Err(PipelineError::Config("results_per_page must be positive".into()));
        }
        Ok(())
    }

    pub fn city_map(&self) -> CityMap {
        CityMap::new(self.city_map.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn geocode_delay(&self) -> Duration {
        Duration::from_millis(self.geocode_delay_ms)
    }

    pub fn adzuna_credentials(&self) -> PipelineResult<AdzunaCredentials<'_>> {
        let app_id = non_blank(self.adzuna_app_id.as_deref())
            .ok_or_else(|| missing("JOBS_ADZUNA_APP_ID"))?;
        let app_key = non_blank(self.adzuna_api_key.as_deref())
            .ok_or_else(|| missing("JOBS_ADZUNA_API_KEY"))?;
        Ok(AdzunaCredentials { app_id, app_key })
    }

    pub fn geocoding_api_key(&self) -> PipelineResult<&str> {
        non_blank(self.geocoding_api_key.as_deref()).ok_or_else(|| missing("JOBS_GEOCODING_API_KEY"))
    }
}

fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

fn missing(var: &str) -> PipelineError {
    PipelineError::Config(format!("{} is not set", var))
}
