//! Catalog fixture configuration.

use serde::{Deserialize, Serialize};

/// Locations of the catalog and student fixtures loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path of the JSON catalog snapshot.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
    /// Path of the JSON student records.
    #[serde(default = "default_students_path")]
    pub students_path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            students_path: default_students_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    "data/catalog.json".to_string()
}

fn default_students_path() -> String {
    "data/students.json".to_string()
}
