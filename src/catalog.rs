use crate::error::{C19Error, Result};
use csv::ReaderBuilder;
use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

pub const NAME_COLUMN: usize = 1;
pub const LOCATION_ID_COLUMN: usize = 3;

/// Normalized location names mapped to the raw location identifiers of the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationCatalog {
    locations: BTreeMap<String, String>,
}

impl LocationCatalog {
    /// Reads the catalog from the display name and identifier columns,
    /// skipping the header row. Later rows overwrite earlier ones with the same name.
    pub fn from_csv<P: AsRef<Path>>(fin: P) -> Result<LocationCatalog> {
        debug!("reading locations from {}", fin.as_ref().display());
        let mut rdr = ReaderBuilder::new().has_headers(true).from_path(fin)?;
        let mut locations = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let name = record.get(NAME_COLUMN).ok_or(C19Error::MissingColumn {
                line,
                column: NAME_COLUMN,
            })?;
            let id = record
                .get(LOCATION_ID_COLUMN)
                .ok_or(C19Error::MissingColumn {
                    line,
                    column: LOCATION_ID_COLUMN,
                })?;
            locations.insert(normalize_name(name), id.to_string());
        }
        debug!("found {} locations", locations.len());
        Ok(LocationCatalog { locations })
    }

    /// Location identifier of a normalized name, or the list of valid names.
    pub fn resolve(&self, name: &str) -> Result<&str> {
        match self.locations.get(name) {
            Some(id) => Ok(id.as_str()),
            None => Err(C19Error::UnknownLocation {
                given: name.to_string(),
                valid: self.names().map(String::from).collect(),
            }),
        }
    }

    /// sorted normalized names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

/// "United States of America" -> "united_states_of_america"
pub fn normalize_name(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}
