//! Scenario and sector definitions and their storage seam.
//!
//! Persistence proper belongs to an outer collaborator; this module owns the
//! seam: the document types, a [`DefinitionStore`] trait, and the in-memory
//! implementation the gateway and tests use. Documents serialize as JSON,
//! which is also the payload format for scenario uploads to the engine.

use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AircraftSpawn, Route, Waypoint};

/// A named scenario: initial traffic plus the sector it plays in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    /// Random seed applied after the scenario initializes.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Sector whose waypoints and routes the scenario uses.
    #[serde(default)]
    pub sector: Option<String>,
    pub spawns: Vec<AircraftSpawn>,
}

/// A named sector: the fixed geography scenarios reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorDefinition {
    pub name: String,
    pub waypoints: Vec<Waypoint>,
    pub routes: Vec<Route>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),

    #[error("unknown sector: {0}")]
    UnknownSector(String),

    #[error("definition serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Load/store seam for scenario and sector documents.
pub trait DefinitionStore: Send + Sync {
    fn load_scenario(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ScenarioDefinition, CatalogError>> + Send;

    fn store_scenario(
        &self,
        definition: ScenarioDefinition,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    fn load_sector(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<SectorDefinition, CatalogError>> + Send;

    fn store_sector(
        &self,
        definition: SectorDefinition,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

/// In-memory definition store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scenarios: RwLock<HashMap<String, ScenarioDefinition>>,
    sectors: RwLock<HashMap<String, SectorDefinition>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scenario_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.scenarios.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn sector_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.sectors.read().unwrap().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DefinitionStore for MemoryStore {
    async fn load_scenario(&self, name: &str) -> Result<ScenarioDefinition, CatalogError> {
        self.scenarios
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownScenario(name.to_string()))
    }

    async fn store_scenario(&self, definition: ScenarioDefinition) -> Result<(), CatalogError> {
        self.scenarios
            .write()
            .unwrap()
            .insert(definition.name.clone(), definition);
        Ok(())
    }

    async fn load_sector(&self, name: &str) -> Result<SectorDefinition, CatalogError> {
        self.sectors
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownSector(name.to_string()))
    }

    async fn store_sector(&self, definition: SectorDefinition) -> Result<(), CatalogError> {
        self.sectors
            .write()
            .unwrap()
            .insert(definition.name.clone(), definition);
        Ok(())
    }
}

/// Serialize a scenario for upload to the engine.
pub fn to_upload_json(definition: &ScenarioDefinition) -> Result<String, CatalogError> {
    Ok(serde_json::to_string(definition)?)
}

/// Parse a scenario document, as uploaded or read from a file.
pub fn scenario_from_json(json: &str) -> Result<ScenarioDefinition, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

/// Parse a sector document.
pub fn sector_from_json(json: &str) -> Result<SectorDefinition, CatalogError> {
    Ok(serde_json::from_str(json)?)
}
