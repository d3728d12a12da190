//! Cached simulation state plus scenario lifecycle orchestration.

use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use crate::catalog::{self, DefinitionStore, ScenarioDefinition, SectorDefinition};
use crate::control::SimulationCommands;
use crate::engine::RawSimulation;
use crate::model::SimulationProperties;

use super::routes::SharedRoutes;
use super::ProxyError;

#[derive(Debug, Default)]
struct SimulationCache {
    raw: Option<RawSimulation>,
    valid: bool,
}

/// Fields the engine never reports back; the proxy is their only source.
#[derive(Debug, Clone, Default)]
struct Tracked {
    scenario: Option<String>,
    sector: Option<String>,
    seed: Option<u64>,
}

/// Simulation state proxy.
///
/// Reads return the engine's raw tuple with the proxy-tracked scenario
/// name, sector, and seed layered on top. Scenario loading runs the whole
/// sequence: resolve the definition and its sector from the catalog, push
/// the document to the engine, rebuild the route table, load, then apply
/// the seed.
#[derive(Debug)]
pub struct SimulationProxy<C, S> {
    controller: C,
    store: Arc<S>,
    routes: SharedRoutes,
    cache: RwLock<SimulationCache>,
    refresh_gate: Mutex<()>,
    tracked: RwLock<Tracked>,
}

impl<C: SimulationCommands, S: DefinitionStore> SimulationProxy<C, S> {
    pub fn new(controller: C, store: Arc<S>, routes: SharedRoutes) -> Self {
        Self {
            controller,
            store,
            routes,
            cache: RwLock::new(SimulationCache::default()),
            refresh_gate: Mutex::new(()),
            tracked: RwLock::new(Tracked::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconciled simulation snapshot, refreshing the cache if needed.
    pub async fn properties(&self) -> Result<SimulationProperties, ProxyError> {
        {
            let cache = self.cache.read().unwrap();
            if cache.valid {
                if let Some(raw) = &cache.raw {
                    return Ok(self.layered(raw));
                }
            }
        }

        let _refresh = self.refresh_gate.lock().await;
        {
            let cache = self.cache.read().unwrap();
            if cache.valid {
                if let Some(raw) = &cache.raw {
                    return Ok(self.layered(raw));
                }
            }
        }

        let raw = self.controller.raw_properties().await?;
        let snapshot = self.layered(&raw);

        let mut cache = self.cache.write().unwrap();
        cache.raw = Some(raw);
        cache.valid = true;
        Ok(snapshot)
    }

    fn layered(&self, raw: &RawSimulation) -> SimulationProperties {
        let tracked = self.tracked.read().unwrap().clone();
        let scenario_name = tracked.scenario.or_else(|| {
            (!raw.scenario_name.is_empty()).then(|| raw.scenario_name.clone())
        });
        SimulationProperties {
            state: raw.state,
            elapsed_sec: raw.elapsed_sec,
            utc: raw.utc.clone(),
            step_size_sec: raw.step_size_sec,
            speed_multiplier: raw.speed_multiplier,
            aircraft_count: raw.aircraft_count,
            scenario_name,
            sector_name: tracked.sector,
            seed: tracked.seed,
        }
    }

    /// Advances the simulation one step. The controller returns once the
    /// engine clock has actually moved; the aircraft cache is the
    /// coordinator's to invalidate.
    pub async fn step(&self) -> Result<(), ProxyError> {
        self.controller.step().await?;
        self.invalidate();
        Ok(())
    }

    pub async fn pause(&self) -> Result<(), ProxyError> {
        self.controller.pause().await?;
        self.invalidate();
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ProxyError> {
        self.controller.resume().await?;
        self.invalidate();
        Ok(())
    }

    pub async fn set_step_size(&self, seconds: f64) -> Result<(), ProxyError> {
        self.controller.set_step_size(seconds).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn set_speed_multiplier(&self, factor: f64) -> Result<(), ProxyError> {
        self.controller.set_speed_multiplier(factor).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn set_seed(&self, seed: u64) -> Result<(), ProxyError> {
        self.controller.set_seed(seed).await?;
        self.tracked.write().unwrap().seed = Some(seed);
        self.invalidate();
        Ok(())
    }

    /// Resets the engine and forgets everything scenario-related: tracked
    /// fields, the route table, the cached tuple. The caller clears the
    /// aircraft proxy alongside.
    pub async fn reset(&self) -> Result<(), ProxyError> {
        self.controller.reset().await?;
        *self.tracked.write().unwrap() = Tracked::default();
        self.routes.clear();
        self.invalidate();
        Ok(())
    }

    /// Loads a scenario by name, with `content` taking precedence over the
    /// catalog copy (and being stored into it).
    ///
    /// The document is always pushed to the engine before loading: a fresh
    /// engine's store is empty, so loading by name alone would only work
    /// for scenarios it happens to remember. Returns the definition so the
    /// caller can prime the aircraft proxy from its spawn list.
    pub async fn load_scenario(
        &self,
        name: &str,
        content: Option<ScenarioDefinition>,
    ) -> Result<ScenarioDefinition, ProxyError> {
        let definition = match content {
            Some(mut definition) => {
                definition.name = name.to_string();
                self.store.store_scenario(definition.clone()).await?;
                definition
            }
            None => self.store.load_scenario(name).await?,
        };

        // Resolve the sector before touching the engine so a broken
        // reference aborts with no side effects.
        let sector = match definition.sector.as_deref() {
            Some(sector_name) => Some(self.store.load_sector(sector_name).await?),
            None => None,
        };

        let json = catalog::to_upload_json(&definition)?;
        self.controller.upload_scenario(name, &json).await?;

        match &sector {
            Some(sector) => self.routes.install_sector(sector),
            None => self.routes.clear(),
        }

        self.controller.load_scenario(name).await?;

        // The seed is applied after the load; loading re-seeds the engine
        // from the scenario document, which would clobber an earlier SEED.
        if let Some(seed) = definition.seed {
            self.controller.set_seed(seed).await?;
        }

        {
            let mut tracked = self.tracked.write().unwrap();
            tracked.scenario = Some(name.to_string());
            tracked.sector = definition.sector.clone();
            tracked.seed = definition.seed;
        }
        self.invalidate();
        Ok(definition)
    }

    /// Installs a sector without loading a scenario.
    pub async fn load_sector(
        &self,
        name: &str,
        content: Option<SectorDefinition>,
    ) -> Result<(), ProxyError> {
        let sector = match content {
            Some(mut sector) => {
                sector.name = name.to_string();
                self.store.store_sector(sector.clone()).await?;
                sector
            }
            None => self.store.load_sector(name).await?,
        };
        self.routes.install_sector(&sector);
        self.tracked.write().unwrap().sector = Some(name.to_string());
        Ok(())
    }

    pub fn invalidate(&self) {
        self.cache.write().unwrap().valid = false;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryStore;
    use crate::engine::EngineError;
    use crate::model::{
        AircraftSpawn, Position, Route, RouteLeg, RunState, Waypoint,
    };
    use crate::proxy::RouteTable;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Default)]
    struct MockSimInner {
        raw: StdMutex<RawSimulation>,
        calls: StdMutex<Vec<String>>,
        fetches: AtomicUsize,
    }

    #[derive(Debug, Clone, Default)]
    struct MockSim {
        inner: Arc<MockSimInner>,
    }

    impl MockSim {
        fn calls(&self) -> Vec<String> {
            self.inner.calls.lock().unwrap().clone()
        }

        fn fetches(&self) -> usize {
            self.inner.fetches.load(Ordering::SeqCst)
        }

        fn log(&self, call: impl Into<String>) {
            self.inner.calls.lock().unwrap().push(call.into());
        }
    }

    impl SimulationCommands for MockSim {
        async fn raw_properties(&self) -> Result<RawSimulation, EngineError> {
            self.inner.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.inner.raw.lock().unwrap().clone())
        }

        async fn step(&self) -> Result<(), EngineError> {
            self.log("STEP");
            let mut raw = self.inner.raw.lock().unwrap();
            raw.elapsed_sec += raw.step_size_sec;
            Ok(())
        }

        async fn reset(&self) -> Result<(), EngineError> {
            self.log("RESET");
            *self.inner.raw.lock().unwrap() = RawSimulation::default();
            Ok(())
        }

        async fn load_scenario(&self, name: &str) -> Result<(), EngineError> {
            self.log(format!("IC {name}"));
            let mut raw = self.inner.raw.lock().unwrap();
            raw.state = RunState::Running;
            raw.scenario_name = name.to_string();
            Ok(())
        }

        async fn upload_scenario(&self, name: &str, _content_json: &str) -> Result<(), EngineError> {
            self.log(format!("SCEN {name}"));
            Ok(())
        }

        async fn pause(&self) -> Result<(), EngineError> {
            self.log("HOLD");
            self.inner.raw.lock().unwrap().state = RunState::Hold;
            Ok(())
        }

        async fn resume(&self) -> Result<(), EngineError> {
            self.log("OP");
            self.inner.raw.lock().unwrap().state = RunState::Running;
            Ok(())
        }

        async fn set_step_size(&self, seconds: f64) -> Result<(), EngineError> {
            self.log(format!("DT {seconds}"));
            self.inner.raw.lock().unwrap().step_size_sec = seconds;
            Ok(())
        }

        async fn set_speed_multiplier(&self, factor: f64) -> Result<(), EngineError> {
            self.log(format!("DTMULT {factor}"));
            self.inner.raw.lock().unwrap().speed_multiplier = factor;
            Ok(())
        }

        async fn set_seed(&self, seed: u64) -> Result<(), EngineError> {
            self.log(format!("SEED {seed}"));
            Ok(())
        }

        async fn shutdown(&self) -> Result<(), EngineError> {
            self.log("QUIT");
            self.inner.raw.lock().unwrap().state = RunState::Ended;
            Ok(())
        }
    }

    fn proxy_over() -> (
        SimulationProxy<MockSim, MemoryStore>,
        MockSim,
        Arc<MemoryStore>,
        SharedRoutes,
    ) {
        let controller = MockSim::default();
        let store = Arc::new(MemoryStore::new());
        let routes: SharedRoutes = Arc::new(RouteTable::new());
        let proxy = SimulationProxy::new(
            controller.clone(),
            Arc::clone(&store),
            Arc::clone(&routes),
        );
        (proxy, controller, store, routes)
    }

    fn scenario(name: &str, sector: Option<&str>) -> ScenarioDefinition {
        ScenarioDefinition {
            name: name.to_string(),
            seed: Some(7),
            sector: sector.map(str::to_string),
            spawns: vec![AircraftSpawn::new(
                "KL204",
                "B738",
                Position::new(52.0, 4.0),
                90.0,
                12_000.0,
                280.0,
            )],
        }
    }

    fn sector(name: &str) -> SectorDefinition {
        SectorDefinition {
            name: name.to_string(),
            waypoints: vec![Waypoint::new("SUGOL", Position::new(52.5, 4.0))],
            routes: vec![Route::new("ARTIP2A", vec![RouteLeg::new("SUGOL")])],
        }
    }

    // ==================== Cache tests ====================

    #[tokio::test]
    async fn test_properties_cached_until_invalidated() {
        let (proxy, controller, _store, _routes) = proxy_over();

        proxy.properties().await.unwrap();
        proxy.properties().await.unwrap();
        assert_eq!(controller.fetches(), 1);

        proxy.step().await.unwrap();
        let props = proxy.properties().await.unwrap();
        assert_eq!(controller.fetches(), 2);
        assert_eq!(props.elapsed_sec, 1.0);
    }

    #[tokio::test]
    async fn test_scenario_name_falls_back_to_broadcast() {
        let (proxy, controller, _store, _routes) = proxy_over();
        controller.inner.raw.lock().unwrap().scenario_name = "warmup".to_string();

        let props = proxy.properties().await.unwrap();
        assert_eq!(props.scenario_name.as_deref(), Some("warmup"));
    }

    #[tokio::test]
    async fn test_empty_broadcast_name_means_no_scenario() {
        let (proxy, _controller, _store, _routes) = proxy_over();
        let props = proxy.properties().await.unwrap();
        assert_eq!(props.scenario_name, None);
    }

    // ==================== Scenario lifecycle tests ====================

    #[tokio::test]
    async fn test_load_scenario_uploads_loads_then_seeds() {
        let (proxy, controller, _store, _routes) = proxy_over();

        let definition = proxy
            .load_scenario("alpha", Some(scenario("alpha", None)))
            .await
            .unwrap();

        assert_eq!(
            controller.calls(),
            vec![
                "SCEN alpha".to_string(),
                "IC alpha".to_string(),
                "SEED 7".to_string(),
            ]
        );
        assert_eq!(definition.spawns.len(), 1);

        let props = proxy.properties().await.unwrap();
        assert_eq!(props.scenario_name.as_deref(), Some("alpha"));
        assert_eq!(props.seed, Some(7));
        assert_eq!(props.state, RunState::Running);
    }

    #[tokio::test]
    async fn test_load_scenario_installs_sector_routes() {
        let (proxy, _controller, store, routes) = proxy_over();
        store.store_sector(sector("EHAA")).await.unwrap();

        proxy
            .load_scenario("alpha", Some(scenario("alpha", Some("EHAA"))))
            .await
            .unwrap();

        assert!(routes.route("ARTIP2A").is_some());
        assert!(routes.contains_waypoint("SUGOL"));
        let props = proxy.properties().await.unwrap();
        assert_eq!(props.sector_name.as_deref(), Some("EHAA"));
    }

    #[tokio::test]
    async fn test_load_scenario_from_catalog_copy() {
        let (proxy, controller, store, _routes) = proxy_over();
        store.store_scenario(scenario("beta", None)).await.unwrap();

        proxy.load_scenario("beta", None).await.unwrap();

        assert!(controller.calls().contains(&"IC beta".to_string()));
    }

    #[tokio::test]
    async fn test_load_unknown_scenario() {
        let (proxy, controller, _store, _routes) = proxy_over();

        let result = proxy.load_scenario("missing", None).await;

        assert!(matches!(result, Err(ProxyError::Catalog(_))));
        assert!(controller.calls().is_empty());
    }

    #[tokio::test]
    async fn test_broken_sector_reference_aborts_before_engine() {
        let (proxy, controller, _store, routes) = proxy_over();

        let result = proxy
            .load_scenario("alpha", Some(scenario("alpha", Some("NOWHERE"))))
            .await;

        assert!(matches!(result, Err(ProxyError::Catalog(_))));
        assert!(controller.calls().is_empty());
        assert!(routes.route_names().is_empty());
    }

    #[tokio::test]
    async fn test_reset_clears_tracking_and_routes() {
        let (proxy, _controller, store, routes) = proxy_over();
        store.store_sector(sector("EHAA")).await.unwrap();
        proxy
            .load_scenario("alpha", Some(scenario("alpha", Some("EHAA"))))
            .await
            .unwrap();

        proxy.reset().await.unwrap();

        assert!(routes.route_names().is_empty());
        let props = proxy.properties().await.unwrap();
        assert_eq!(props.state, RunState::Init);
        assert_eq!(props.scenario_name, None);
        assert_eq!(props.sector_name, None);
        assert_eq!(props.seed, None);
    }

    #[tokio::test]
    async fn test_load_sector_standalone() {
        let (proxy, _controller, store, routes) = proxy_over();

        proxy
            .load_sector("EHAA", Some(sector("EHAA")))
            .await
            .unwrap();

        assert!(routes.route("ARTIP2A").is_some());
        // Stored into the catalog for later loads by name.
        assert!(store.load_sector("EHAA").await.is_ok());
        let props = proxy.properties().await.unwrap();
        assert_eq!(props.sector_name.as_deref(), Some("EHAA"));
    }

    #[tokio::test]
    async fn test_set_seed_is_tracked() {
        let (proxy, controller, _store, _routes) = proxy_over();

        proxy.set_seed(42).await.unwrap();

        assert_eq!(controller.calls(), vec!["SEED 42".to_string()]);
        let props = proxy.properties().await.unwrap();
        assert_eq!(props.seed, Some(42));
    }
}
