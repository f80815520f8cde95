use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::adzuna::JobSource;
use crate::analysis::{self, report::{DescriptionReport, CATEGORIES}};
use crate::db;
use crate::geocode::{self, Geocoder};
use crate::location::{self, CityMap};
use crate::settings::Settings;

pub struct ExtractionStats {
    pub pages: u32,
    pub failed_pages: u32,
    pub fetched: usize,
    pub inserted: usize,
}

/// Fetch pages `1..=pages` and insert everything gathered in one write.
/// A failing page is logged and skipped.
pub fn run_extraction(
    conn: &Connection,
    source: &dyn JobSource,
    pages: u32,
    max_days_old: Option<u32>,
) -> Result<ExtractionStats> {
    let mut jobs = Vec::new();
    let mut failed_pages = 0;
    for page in 1..=pages {
        match source.fetch_page(page, max_days_old) {
            Ok(batch) => jobs.extend(batch),
            Err(e) => {
                warn!("Search page {} failed: {}", page, e);
                failed_pages += 1;
            }
        }
    }

    let inserted = if jobs.is_empty() {
        0
    } else {
        db::insert_jobs(conn, &jobs).context("Failed to insert job listings")?
    };
    info!("Fetched {} listings, inserted {} new", jobs.len(), inserted);

    Ok(ExtractionStats {
        pages,
        failed_pages,
        fetched: jobs.len(),
        inserted,
    })
}

/// The hourly refresh: first page only, listings at most one day old.
pub fn run_update(conn: &Connection, source: &dyn JobSource) -> Result<ExtractionStats> {
    run_extraction(conn, source, 1, Some(1))
}

pub struct CleanStats {
    pub loaded: usize,
    pub kept: usize,
    pub mapped: usize,
}

pub fn run_clean_locations(conn: &Connection, cities: &CityMap) -> Result<CleanStats> {
    let rows = db::fetch_locations(conn)?;
    debug!("Mapping {} locations against {} city keys", rows.len(), cities.len());
    let cleaned = location::clean_locations(&rows, cities);
    for r in cleaned.iter().filter(|r| r.cleaned_location.is_none()) {
        debug!("No city for job {} ('{}')", r.id, r.location);
    }
    let mapped = cleaned.iter().filter(|r| r.cleaned_location.is_some()).count();
    db::update_cleaned_locations(conn, &cleaned).context("Failed to update cleaned_location")?;
    info!(
        "Cleaned {} locations ({} dropped as country-only, {} mapped)",
        cleaned.len(),
        rows.len() - cleaned.len(),
        mapped
    );
    Ok(CleanStats {
        loaded: rows.len(),
        kept: cleaned.len(),
        mapped,
    })
}

pub struct GeocodeStats {
    pub looked_up: usize,
    pub accepted: usize,
}

/// Geocode every cleaned location, then write all coordinates once the batch is done.
pub fn run_coordinates(
    conn: &Connection,
    geocoder: &dyn Geocoder,
    settings: &Settings,
    limit: Option<usize>,
) -> Result<GeocodeStats> {
    let rows = db::fetch_cleaned_locations(conn, limit)?;
    let geocoded = geocode::add_coordinates(
        &rows,
        geocoder,
        &settings.target_country_code,
        settings.geocode_delay(),
    );
    for r in geocoded.iter().filter(|r| r.lat.is_none()) {
        debug!("No coordinates for job {} ('{}')", r.id, r.city);
    }
    let accepted = db::update_coordinates(conn, &geocoded).context("Failed to update coordinates")?;
    Ok(GeocodeStats {
        looked_up: rows.len(),
        accepted,
    })
}

/// Load the description corpus from a JSON file holding an array of strings.
pub fn load_descriptions_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let descriptions: Vec<String> =
        serde_json::from_str(&raw).with_context(|| format!("{:?} is not a JSON array of strings", path))?;
    Ok(descriptions)
}

pub fn run_description_analysis(
    conn: &Connection,
    descriptions: &[String],
    settings: &Settings,
) -> Result<DescriptionReport> {
    let report = analysis::analyze_descriptions(descriptions, settings);
    db::save_frequencies(conn, &CATEGORIES, &report.frequency_rows())
        .context("Failed to save word frequencies")?;
    Ok(report)
}

pub fn export_report(report: &DescriptionReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::HashMap;

    use super::*;
    use crate::db::{job, JobRecord};
    use crate::error::{PipelineError, PipelineResult};
    use crate::geocode::mock::MockGeocoder;

    struct FakeSource {
        pages: HashMap<u32, Vec<JobRecord>>,
        last_max_days: Cell<Option<u32>>,
    }

    impl JobSource for FakeSource {
        fn fetch_page(&self, page: u32, max_days_old: Option<u32>) -> PipelineResult<Vec<JobRecord>> {
            self.last_max_days.set(max_days_old);
            self.pages.get(&page).cloned().ok_or(PipelineError::Status {
                service: "fake",
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    #[test]
    fn extraction_skips_failed_pages() {
        let conn = db::open_in_memory().unwrap();
        let source = FakeSource {
            pages: HashMap::from([
                (1, vec![job(1, "Leeds", "a"), job(2, "UK", "b")]),
                (3, vec![job(2, "UK", "b"), job(3, "London", "c")]),
            ]),
            last_max_days: Cell::new(None),
        };
        let stats = run_extraction(&conn, &source, 3, None).unwrap();
        assert_eq!(stats.failed_pages, 1);
        assert_eq!(stats.fetched, 4);
        assert_eq!(stats.inserted, 3);
    }

    #[test]
    fn update_asks_for_recent_first_page() {
        let conn = db::open_in_memory().unwrap();
        let source = FakeSource {
            pages: HashMap::from([(1, vec![job(9, "Leeds", "a")])]),
            last_max_days: Cell::new(None),
        };
        let stats = run_update(&conn, &source).unwrap();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.inserted, 1);
        assert_eq!(source.last_max_days.get(), Some(1));
    }

    #[test]
    fn end_to_end_location_cleaning() {
        let conn = db::open_in_memory().unwrap();
        db::insert_jobs(
            &conn,
            &[job(1, "  UK  ", ""), job(2, "Greater Manchester, England", "")],
        )
        .unwrap();
        let cities = CityMap::new([("manchester", "Manchester")]);

        let stats = run_clean_locations(&conn, &cities).unwrap();
        assert_eq!((stats.loaded, stats.kept, stats.mapped), (2, 1, 1));

        let cleaned: Vec<(i64, Option<String>)> = conn
            .prepare("SELECT id, cleaned_location FROM jobs ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(cleaned, vec![(1, None), (2, Some("Manchester".to_string()))]);
    }

    #[test]
    fn coordinates_written_only_for_target_country() {
        let conn = db::open_in_memory().unwrap();
        db::insert_jobs(
            &conn,
            &[job(1, "Manchester", ""), job(2, "Cambridge", ""), job(3, "Remote", "")],
        )
        .unwrap();
        let cities = CityMap::new([("manchester", "Manchester"), ("cambridge", "Cambridge")]);
        run_clean_locations(&conn, &cities).unwrap();

        let geo = MockGeocoder::default()
            .with("Manchester", "gb", 53.48, -2.24)
            .with("Cambridge", "us", 42.37, -71.11);
        let settings = Settings {
            geocode_delay_ms: 0,
            ..Settings::default()
        };
        let stats = run_coordinates(&conn, &geo, &settings, None).unwrap();
        assert_eq!(stats.looked_up, 2);
        assert_eq!(stats.accepted, 1);

        let coords: Vec<(i64, Option<f64>, Option<f64>)> = conn
            .prepare("SELECT id, lat, lon FROM jobs ORDER BY id")
            .unwrap()
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            coords,
            vec![(1, Some(53.48), Some(-2.24)), (2, None, None), (3, None, None)]
        );
    }

    #[test]
    fn description_analysis_persists_and_exports() {
        let conn = db::open_in_memory().unwrap();
        let descriptions = vec![
            "Python, SQL and Google Cloud. Teamwork matters.".to_string(),
            "More Python please".to_string(),
        ];
        let settings = Settings::default();
        let report = run_description_analysis(&conn, &descriptions, &settings).unwrap();
        assert_eq!(report.technologies.get("Python"), Some(&2));
        assert_eq!(report.soft_skills.get("Teamwork"), Some(&1));

        let stored: i64 = conn
            .query_row(
                "SELECT count FROM word_frequencies WHERE category = 'technologies' AND term = 'Python'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(stored, 2);

        let path = std::env::temp_dir().join(format!("jobs_pipeline_report_{}.json", std::process::id()));
        export_report(&report, &path).unwrap();
        let back: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(back["technologies"]["Python"], 2);
    }

    #[test]
    fn rerun_clears_categories_that_came_back_empty() {
        let conn = db::open_in_memory().unwrap();
        let settings = Settings::default();
        run_description_analysis(&conn, &["Python and teamwork".to_string()], &settings).unwrap();

        let report = run_description_analysis(&conn, &["Kafka pipelines".to_string()], &settings).unwrap();
        assert!(report.soft_skills.is_empty());

        let count = |category: &str| -> i64 {
            conn.query_row(
                "SELECT COUNT(*) FROM word_frequencies WHERE category = ?1",
                [category],
                |r| r.get(0),
            )
            .unwrap()
        };
        assert_eq!(count("soft_skills"), 0);
        assert_eq!(count("top_words"), 2);
    }

    #[test]
    fn offline_descriptions_file() {
        let path = std::env::temp_dir().join(format!("jobs_pipeline_desc_{}.json", std::process::id()));
        std::fs::write(&path, r#"["first posting", "second posting"]"#).unwrap();
        let loaded = load_descriptions_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, vec!["first posting", "second posting"]);

        assert!(load_descriptions_file(Path::new("/nonexistent/descriptions.json")).is_err());
    }
}
