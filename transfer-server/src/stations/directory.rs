//! Station directory for autocomplete and name resolution.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::Coord;

use super::error::StationError;
use super::normalize::normalize;

/// A station that can be suggested to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationEntry {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: String,
    pub is_main_station: bool,
}

impl StationEntry {
    pub fn coord(&self) -> Coord {
        Coord::new(self.latitude, self.longitude)
    }
}

/// One row of the stations CSV. Unknown columns are ignored.
#[derive(Debug, Deserialize)]
struct StationRow {
    id: String,
    name: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
    #[serde(default)]
    country: String,
    #[serde(default)]
    is_suggestable: String,
    #[serde(default)]
    is_main_station: String,
}

impl StationRow {
    /// Keep suggestable rows with usable coordinates.
    fn into_entry(self) -> Option<StationEntry> {
        if self.is_suggestable != "t" {
            return None;
        }
        let latitude = self.latitude.trim().parse::<f64>().ok()?;
        let longitude = self.longitude.trim().parse::<f64>().ok()?;
        if !Coord::new(latitude, longitude).is_valid() {
            return None;
        }
        Some(StationEntry {
            id: self.id,
            name: self.name,
            slug: self.slug,
            latitude,
            longitude,
            country: self.country,
            is_main_station: self.is_main_station == "t",
        })
    }
}

#[derive(Debug, Default)]
struct Index {
    stations: Vec<StationEntry>,
    /// Normalized name per station, same order as `stations`.
    names: Vec<String>,
}

impl Index {
    fn build(stations: Vec<StationEntry>) -> Self {
        let names = stations.iter().map(|s| normalize(&s.name)).collect();
        Self { stations, names }
    }

    fn autocomplete(&self, query: &str, limit: usize) -> Vec<StationEntry> {
        let q = normalize(query);
        if q.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut prefix = Vec::new();
        let mut substring = Vec::new();
        for (i, name) in self.names.iter().enumerate() {
            let key = (!self.stations[i].is_main_station, name.as_str(), i);
            if name.starts_with(&q) {
                prefix.push(key);
            } else if name.contains(&q) {
                substring.push(key);
            }
        }
        prefix.sort_unstable();
        substring.sort_unstable();

        prefix
            .into_iter()
            .chain(substring)
            .take(limit)
            .map(|(_, _, i)| self.stations[i].clone())
            .collect()
    }

    fn resolve(&self, name: &str) -> Option<StationEntry> {
        let q = normalize(name);
        if let Some(i) = self.names.iter().position(|n| *n == q) {
            return Some(self.stations[i].clone());
        }
        self.autocomplete(name, 1).into_iter().next()
    }
}

/// Thread-safe station directory loaded from a `;`-delimited CSV.
///
/// Search is accent-insensitive and lowercase. Supports reloading the file
/// in the background.
#[derive(Clone)]
pub struct StationDirectory {
    inner: Arc<RwLock<Index>>,
    path: Option<PathBuf>,
}

fn read_entries<R: Read>(reader: csv::Reader<R>) -> Result<Vec<StationEntry>, StationError> {
    let mut stations = Vec::new();
    for row in reader.into_deserialize::<StationRow>() {
        if let Some(entry) = row?.into_entry() {
            stations.push(entry);
        }
    }
    Ok(stations)
}

fn csv_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.delimiter(b';').flexible(true);
    builder
}

impl StationDirectory {
    /// Load the directory from a CSV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StationError> {
        let path = path.as_ref().to_path_buf();
        let stations = load_file(&path)?;
        info!(path = %path.display(), stations = stations.len(), "loaded station directory");
        Ok(Self {
            inner: Arc::new(RwLock::new(Index::build(stations))),
            path: Some(path),
        })
    }

    /// Build a directory from CSV data in memory.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StationError> {
        let stations = read_entries(csv_builder().from_reader(reader))?;
        Ok(Self::from_entries(stations))
    }

    pub fn from_entries(stations: Vec<StationEntry>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Index::build(stations))),
            path: None,
        }
    }

    /// Stations matching a partial name, best first.
    ///
    /// Prefix matches come before substring matches; within each group main
    /// stations come first, then alphabetical order.
    pub async fn autocomplete(&self, query: &str, limit: usize) -> Vec<StationEntry> {
        let guard = self.inner.read().await;
        guard.autocomplete(query, limit)
    }

    /// Look up a station by name: exact normalized match, else the best
    /// autocomplete hit.
    pub async fn resolve(&self, name: &str) -> Result<StationEntry, StationError> {
        let guard = self.inner.read().await;
        guard
            .resolve(name)
            .ok_or_else(|| StationError::NotFound(name.trim().to_string()))
    }

    /// Get the number of stations in the directory.
    pub async fn len(&self) -> usize {
        self.inner.read().await.stations.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.stations.is_empty()
    }

    /// Re-read the CSV file.
    ///
    /// On success, replaces the current entries. On failure, the existing
    /// entries are preserved and the error is returned. A directory built
    /// in memory is left unchanged.
    pub async fn reload(&self) -> Result<usize, StationError> {
        let Some(path) = &self.path else {
            return Ok(self.len().await);
        };
        let stations = load_file(path)?;
        let count = stations.len();
        let index = Index::build(stations);

        let mut guard = self.inner.write().await;
        *guard = index;
        debug!(stations = count, "reloaded station directory");
        Ok(count)
    }
}

fn load_file(path: &Path) -> Result<Vec<StationEntry>, StationError> {
    let reader = csv_builder()
        .from_path(path)
        .map_err(|source| StationError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    read_entries(reader)
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A small stations file in the trainline layout.
    pub const STATIONS_CSV: &str = "\
id;name;slug;uic;latitude;longitude;country;is_suggestable;is_main_station
1;Strasbourg;strasbourg;8721202;48.585;7.734;FR;t;t
2;Strasbourg Roethig;strasbourg-roethig;;48.569;7.706;FR;t;f
3;Colmar;colmar;8718201;48.073;7.347;FR;t;t
4;Basel SBB;basel-sbb;8500010;47.547;7.589;CH;t;t
5;Bâle Saint-Louis;bale-saint-louis;;47.589;7.558;FR;t;f
6;Genève;geneve;8501008;46.210;6.142;CH;t;t
7;Hidden Halt;hidden-halt;;48.0;7.0;FR;f;f
8;Nowhere;nowhere;;;;FR;t;f
9;Mulhouse;mulhouse;8718000;47.742;7.342;FR;t;t
";
}
