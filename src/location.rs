use crate::db::{CleanedLocationRow, LocationRow};

/// Raw locations that carry no city signal; such rows are dropped before mapping.
const GENERIC_LOCATION: &str = "UK";

/// Lowercase substring → canonical city.
///
/// Keys are held longest first (ties alphabetical) so a longer, more specific
/// key always wins over a shorter key it contains, independent of the order
/// the table was written in.
#[derive(Debug, Clone)]
pub struct CityMap {
    entries: Vec<(String, String)>,
}

impl CityMap {
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut entries: Vec<(String, String)> = entries
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v.to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        entries.dedup_by(|a, b| a.0 == b.0);
        CityMap { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First key found as a substring of the trimmed, lowercased location.
    pub fn map_city(&self, location: &str) -> Option<&str> {
        let needle = location.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|(key, _)| needle.contains(key.as_str()))
            .map(|(_, city)| city.as_str())
    }
}

pub fn is_generic_location(location: &str) -> bool {
    location.trim() == GENERIC_LOCATION
}

/// Drop country-only rows and attach the canonical city to the rest.
pub fn clean_locations(rows: &[LocationRow], cities: &CityMap) -> Vec<CleanedLocationRow> {
    rows.iter()
        .filter(|r| !is_generic_location(&r.location))
        .map(|r| CleanedLocationRow {
            id: r.id,
            location: r.location.to_lowercase(),
            cleaned_location: cities.map_city(&r.location).map(str::to_string),
        })
        .collect()
}
