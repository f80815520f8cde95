use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

#[cfg(test)]
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS jobs (
            id               INTEGER PRIMARY KEY,
            title            TEXT,
            description      TEXT,
            company          TEXT,
            location         TEXT,
            salary_min       REAL,
            salary_max       REAL,
            redirect_url     TEXT,
            created          TEXT NOT NULL,
            cleaned_location TEXT,
            lat              REAL,
            lon              REAL
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_cleaned_location ON jobs(cleaned_location);

        CREATE TABLE IF NOT EXISTS word_frequencies (
            category    TEXT NOT NULL,
            term        TEXT NOT NULL,
            count       INTEGER NOT NULL,
            computed_at TEXT NOT NULL,
            PRIMARY KEY (category, term)
        );
        ",
    )?;
    Ok(())
}

// ── Ingestion ──

#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub company: String,
    pub location: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub redirect_url: String,
}

/// Insert new listings; rows whose id already exists are left untouched.
pub fn insert_jobs(conn: &Connection, jobs: &[JobRecord]) -> Result<usize> {
    let created = Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO jobs
             (id, title, description, company, location, salary_min, salary_max, redirect_url, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for j in jobs {
            count += stmt.execute(rusqlite::params![
                j.id, j.title, j.description, j.company, j.location,
                j.salary_min, j.salary_max, j.redirect_url, created,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Location cleaning ──

pub struct LocationRow {
    pub id: i64,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedLocationRow {
    pub id: i64,
    pub location: String,
    pub cleaned_location: Option<String>,
}

pub fn fetch_locations(conn: &Connection) -> Result<Vec<LocationRow>> {
    let mut stmt = conn.prepare("SELECT id, location FROM jobs WHERE location IS NOT NULL ORDER BY id")?;
    let rows = stmt
        .query_map([], |row| {
            Ok(LocationRow {
                id: row.get(0)?,
                location: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Keyed by id; unmapped rows are written as NULL.
pub fn update_cleaned_locations(conn: &Connection, rows: &[CleanedLocationRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("UPDATE jobs SET cleaned_location = ?1 WHERE id = ?2")?;
        for r in rows {
            count += stmt.execute(rusqlite::params![r.cleaned_location, r.id])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Geocoding ──

pub struct CityRow {
    pub id: i64,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedRow {
    pub id: i64,
    pub city: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub fn fetch_cleaned_locations(conn: &Connection, limit: Option<usize>) -> Result<Vec<CityRow>> {
    let sql = format!(
        "SELECT id, cleaned_location FROM jobs
         WHERE cleaned_location IS NOT NULL
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CityRow {
                id: row.get(0)?,
                city: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Only rows carrying both coordinates are written.
pub fn update_coordinates(conn: &Connection, rows: &[GeocodedRow]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare("UPDATE jobs SET lat = ?1, lon = ?2 WHERE id = ?3")?;
        for r in rows {
            if let (Some(lat), Some(lon)) = (r.lat, r.lon) {
                count += stmt.execute(rusqlite::params![lat, lon, r.id])?;
            }
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Descriptions ──

pub fn fetch_descriptions(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT description FROM jobs
         WHERE description IS NOT NULL AND description <> ''
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Replace every category present in `rows` with the new counts.
/// Replace every category in `categories`, including ones with no rows this run.
pub fn save_frequencies(
    conn: &Connection,
    categories: &[&str],
    rows: &[(&str, &str, usize)],
) -> Result<usize> {
    let computed_at = Utc::now().to_rfc3339();
    let tx = conn.unchecked_transaction()?;
    {
        let mut clear = tx.prepare("DELETE FROM word_frequencies WHERE category = ?1")?;
        for c in categories {
            clear.execute(rusqlite::params![c])?;
        }

        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO word_frequencies (category, term, count, computed_at)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        for (category, term, count) in rows {
            stmt.execute(rusqlite::params![category, term, *count as i64, computed_at])?;
        }
    }
    tx.commit()?;
    Ok(rows.len())
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub generic_location: usize,
    pub cleaned: usize,
    pub geocoded: usize,
    pub frequency_terms: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let count = |sql: &str| -> Result<usize> {
        let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n as usize)
    };
    Ok(Stats {
        total: count("SELECT COUNT(*) FROM jobs")?,
        generic_location: count("SELECT COUNT(*) FROM jobs WHERE TRIM(location) = 'UK'")?,
        cleaned: count("SELECT COUNT(*) FROM jobs WHERE cleaned_location IS NOT NULL")?,
        geocoded: count("SELECT COUNT(*) FROM jobs WHERE lat IS NOT NULL AND lon IS NOT NULL")?,
        frequency_terms: count("SELECT COUNT(*) FROM word_frequencies")?,
    })
}

#[cfg(test)]
pub fn job(id: i64, location: &str, description: &str) -> JobRecord {
    JobRecord {
        id,
        title: "Data Engineer".to_string(),
        description: description.to_string(),
        company: "Acme".to_string(),
        location: location.to_string(),
        salary_min: None,
        salary_max: None,
        redirect_url: format!("https://example.com/jobs/{}", id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_ignores_existing_ids() {
        let conn = open_in_memory().unwrap();
        assert_eq!(insert_jobs(&conn, &[job(1, "Leeds", "a"), job(2, "UK", "b")]).unwrap(), 2);

        let mut dup = job(1, "Bristol", "changed");
        dup.salary_min = Some(50_000.0);
        assert_eq!(insert_jobs(&conn, &[dup, job(3, "York", "c")]).unwrap(), 1);

        let loc: String = conn
            .query_row("SELECT location FROM jobs WHERE id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(loc, "Leeds");
        assert_eq!(get_stats(&conn).unwrap().total, 3);
    }

    #[test]
    fn cleaned_location_update_writes_nulls() {
        let conn = open_in_memory().unwrap();
        insert_jobs(&conn, &[job(1, "Leeds", ""), job(2, "Remote", "")]).unwrap();
        conn.execute("UPDATE jobs SET cleaned_location = 'Stale' WHERE id = 2", [])
            .unwrap();

        let rows = vec![
            CleanedLocationRow { id: 1, location: "leeds".into(), cleaned_location: Some("Leeds".into()) },
            CleanedLocationRow { id: 2, location: "remote".into(), cleaned_location: None },
        ];
        assert_eq!(update_cleaned_locations(&conn, &rows).unwrap(), 2);

        let cities = fetch_cleaned_locations(&conn, None).unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].id, 1);
        assert_eq!(cities[0].city, "Leeds");
    }

    #[test]
    fn coordinates_require_both_values() {
        let conn = open_in_memory().unwrap();
        insert_jobs(&conn, &[job(1, "Leeds", ""), job(2, "Paris", "")]).unwrap();
        let rows = vec![
            GeocodedRow { id: 1, city: "Leeds".into(), lat: Some(53.8), lon: Some(-1.55) },
            GeocodedRow { id: 2, city: "Paris".into(), lat: None, lon: None },
        ];
        assert_eq!(update_coordinates(&conn, &rows).unwrap(), 1);
        assert_eq!(get_stats(&conn).unwrap().geocoded, 1);
    }

    #[test]
    fn descriptions_skip_blank_rows() {
        let conn = open_in_memory().unwrap();
        insert_jobs(&conn, &[job(2, "Leeds", "second"), job(1, "Leeds", "first"), job(3, "", "")])
            .unwrap();
        assert_eq!(fetch_descriptions(&conn).unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn frequencies_replace_whole_category() {
        let conn = open_in_memory().unwrap();
        let categories = ["technologies", "soft_skills"];
        save_frequencies(&conn, &categories, &[("technologies", "Python", 3), ("technologies", "AWS", 1)])
            .unwrap();
        save_frequencies(
            &conn,
            &categories,
            &[("technologies", "Rust", 2), ("soft_skills", "Teamwork", 1)],
        )
        .unwrap();

        let mut stmt = conn
            .prepare("SELECT category, term, count FROM word_frequencies ORDER BY category, term")
            .unwrap();
        let rows: Vec<(String, String, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                ("soft_skills".to_string(), "Teamwork".to_string(), 1),
                ("technologies".to_string(), "Rust".to_string(), 2),
            ]
        );

        // a category with no rows this time is still cleared
        save_frequencies(&conn, &categories, &[("technologies", "Rust", 1)]).unwrap();
        let soft: i64 = conn
            .query_row("SELECT COUNT(*) FROM word_frequencies WHERE category = 'soft_skills'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(soft, 0);
    }
}
