//! Incremental routing estimation engine
//!
//! [`RoutingEstimator`] keeps one [`RoutingRecord`] per routable net and an
//! aggregate wirelength. It listens to design changes through a
//! [`DesignObserver`] and marks the affected nets dirty; the next
//! [`update_routing`](RoutingEstimator::update_routing) recomputes only those.
//!
//! A net is routable when it has at least two pins and is not the clock net
//! of the active scenario.

use crate::error::{Result, RoutingError};
use crate::estimation::RoutingEstimationModel;
use crate::extraction::RoutingExtractionModel;
use crate::rctree::RcTree;
use indexmap::IndexSet;
use log::{debug, info, warn};
use parasol_netlist::{
    Attribute, Dbu, DbuPoint, Design, DesignObserver, InstanceId, LibraryCellId, NetId,
    ObserverHandle, PinId, Scenario,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Run full updates on a worker pool
    pub parallel: bool,
    /// Upper bound on worker threads; 0 means one per CPU
    pub max_workers: usize,
    /// Refuse to start without both an estimation and an extraction model
    pub require_strategies: bool,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_workers: 0,
            require_strategies: false,
        }
    }
}

impl EstimatorConfig {
    /// Effective number of workers for a full update
    pub fn worker_count(&self) -> usize {
        let cpus = num_cpus::get().max(1);
        if self.max_workers == 0 {
            cpus
        } else {
            self.max_workers.min(cpus)
        }
    }
}

/// Estimated routing of one net
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingRecord {
    /// Manhattan length of the estimated topology
    pub wirelength: Dbu,
    /// Extracted parasitics, empty when extraction is unavailable
    pub rc_tree: RcTree,
}

/// Outcome of an update pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStats {
    /// Nets whose record was recomputed
    pub updated: usize,
    /// Nets left without a record (fewer than two pins, or the clock net)
    pub skipped: usize,
    /// Recomputed nets that fell back to an empty record
    pub degraded: usize,
}

impl UpdateStats {
    fn record(&mut self, degraded: bool) {
        self.updated += 1;
        if degraded {
            self.degraded += 1;
        }
    }
}

#[derive(Default)]
struct EstimatorState {
    records: Attribute<NetId, RoutingRecord>,
    dirty: IndexSet<NetId>,
    total_wirelength: Dbu,
    full_update_performed: bool,
}

impl EstimatorState {
    fn store(&mut self, net: NetId, record: RoutingRecord) {
        self.total_wirelength += record.wirelength;
        if let Some(previous) = self.records.insert(net, record) {
            self.total_wirelength -= previous.wirelength;
        }
    }

    fn discard(&mut self, net: NetId) {
        if let Some(previous) = self.records.remove(net) {
            self.total_wirelength -= previous.wirelength;
        }
    }

    fn mark_dirty(&mut self, net: NetId) {
        self.dirty.insert(net);
    }
}

fn lock(state: &Mutex<EstimatorState>) -> MutexGuard<'_, EstimatorState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Design observer feeding the dirty set
struct DirtyTracker {
    state: Arc<Mutex<EstimatorState>>,
}

impl DirtyTracker {
    fn mark_instance_nets(&self, design: &Design, instance: InstanceId) {
        let nets = design.instance_nets(instance);
        let mut state = lock(&self.state);
        for net in nets {
            state.mark_dirty(net);
        }
    }
}

impl DesignObserver for DirtyTracker {
    fn on_post_net_create(&self, _design: &Design, net: NetId) {
        lock(&self.state).mark_dirty(net);
    }

    fn on_pre_net_remove(&self, _design: &Design, net: NetId) {
        let mut state = lock(&self.state);
        state.discard(net);
        state.dirty.shift_remove(&net);
    }

    fn on_post_instance_move(&self, design: &Design, instance: InstanceId) {
        self.mark_instance_nets(design, instance);
    }

    fn on_post_cell_remap(&self, design: &Design, instance: InstanceId, _previous: LibraryCellId) {
        self.mark_instance_nets(design, instance);
    }

    fn on_post_pin_connect(&self, _design: &Design, _pin: PinId, net: NetId) {
        lock(&self.state).mark_dirty(net);
    }

    fn on_pre_pin_disconnect(&self, _design: &Design, _pin: PinId, net: NetId) {
        lock(&self.state).mark_dirty(net);
    }
}

/// Collects the strategies of a [`RoutingEstimator`] before it attaches to a
/// design
pub struct RoutingEstimatorBuilder {
    config: EstimatorConfig,
    scenario: Arc<dyn Scenario>,
    estimation_model: Option<Arc<dyn RoutingEstimationModel>>,
    extraction_model: Option<Arc<dyn RoutingExtractionModel>>,
}

impl RoutingEstimatorBuilder {
    pub fn estimation_model(mut self, model: Arc<dyn RoutingEstimationModel>) -> Self {
        self.estimation_model = Some(model);
        self
    }

    pub fn extraction_model(mut self, model: Arc<dyn RoutingExtractionModel>) -> Self {
        self.extraction_model = Some(model);
        self
    }

    /// Set or clear the estimation model
    pub fn maybe_estimation_model(mut self, model: Option<Arc<dyn RoutingEstimationModel>>) -> Self {
        self.estimation_model = model;
        self
    }

    /// Attach to `design` and return the ready engine. Records start empty;
    /// the first [`update_routing`](RoutingEstimator::update_routing) runs a
    /// full pass.
    pub fn start(self, design: &mut Design) -> Result<RoutingEstimator> {
        for (present, what) in [
            (self.estimation_model.is_some(), "estimation"),
            (self.extraction_model.is_some(), "extraction"),
        ] {
            if !present {
                if self.config.require_strategies {
                    return Err(RoutingError::MissingStrategy(what));
                }
                warn!(
                    "No routing {} model configured; nets will get empty routing records",
                    what
                );
            }
        }

        let state = Arc::new(Mutex::new(EstimatorState::default()));
        let observer = design.register_observer(Arc::new(DirtyTracker {
            state: Arc::clone(&state),
        }));

        info!(
            "Routing estimator started on design '{}' ({} nets, estimation: {})",
            design.name,
            design.num_nets(),
            self.estimation_model
                .as_ref()
                .map_or("none", |model| model.name())
        );

        Ok(RoutingEstimator {
            config: self.config,
            scenario: self.scenario,
            estimation_model: self.estimation_model,
            extraction_model: self.extraction_model,
            state,
            observer,
        })
    }
}

/// Incremental routing estimation engine bound to one design
pub struct RoutingEstimator {
    config: EstimatorConfig,
    scenario: Arc<dyn Scenario>,
    estimation_model: Option<Arc<dyn RoutingEstimationModel>>,
    extraction_model: Option<Arc<dyn RoutingExtractionModel>>,
    state: Arc<Mutex<EstimatorState>>,
    observer: ObserverHandle,
}

impl RoutingEstimator {
    pub fn builder(config: EstimatorConfig, scenario: Arc<dyn Scenario>) -> RoutingEstimatorBuilder {
        RoutingEstimatorBuilder {
            config,
            scenario,
            estimation_model: None,
            extraction_model: None,
        }
    }

    /// Detach from `design`. Dropping the engine without calling this leaves
    /// its observer registered.
    pub fn stop(self, design: &mut Design) {
        if design.unregister_observer(self.observer) {
            info!("Routing estimator stopped on design '{}'", design.name);
        } else {
            warn!(
                "Routing estimator was not attached to design '{}'",
                design.name
            );
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    fn is_routable(&self, design: &Design, net: NetId) -> bool {
        design.num_pins(net) >= 2 && !self.scenario.is_clock_net(net)
    }

    /// Estimate and extract one net without touching engine state.
    /// The flag reports a fallback to an empty record.
    fn compute_record(&self, design: &Design, net: NetId) -> (RoutingRecord, bool) {
        let Some(estimation) = &self.estimation_model else {
            return (RoutingRecord::default(), true);
        };

        match estimation.estimate(design, net) {
            Ok((topology, wirelength)) => {
                let rc_tree = self
                    .extraction_model
                    .as_ref()
                    .map(|model| model.extract(&topology))
                    .unwrap_or_default();
                let degraded = self.extraction_model.is_none();
                (RoutingRecord { wirelength, rc_tree }, degraded)
            }
            Err(e) => {
                let name = design.net(net).map_or_else(|_| net.to_string(), |n| n.name.clone());
                warn!("Routing estimation failed for net '{}': {}", name, e);
                (RoutingRecord::default(), true)
            }
        }
    }

    fn refresh_net(&self, state: &mut EstimatorState, design: &Design, net: NetId, stats: &mut UpdateStats) {
        if !self.is_routable(design, net) {
            state.discard(net);
            stats.skipped += 1;
            return;
        }
        let (record, degraded) = self.compute_record(design, net);
        state.store(net, record);
        stats.record(degraded);
    }

    /// Recompute one net and replace its contribution to the aggregate
    pub fn update_routing_of_net(&self, design: &Design, net: NetId) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let mut state = lock(&self.state);
        self.refresh_net(&mut state, design, net, &mut stats);
        state.dirty.shift_remove(&net);
        stats
    }

    /// Recompute every routable net regardless of the dirty set
    pub fn update_routing_full(&self, design: &Design) -> UpdateStats {
        let mut stats = UpdateStats::default();
        let mut routable = Vec::with_capacity(design.num_nets());
        for net in design.net_ids() {
            if self.is_routable(design, net) {
                routable.push(net);
            } else {
                stats.skipped += 1;
            }
        }

        let workers = self.config.worker_count();
        let computed = if self.config.parallel && workers > 1 && routable.len() > 1 {
            self.compute_parallel(design, &routable, workers)
        } else {
            routable
                .iter()
                .map(|&net| self.compute_record(design, net))
                .collect()
        };

        let mut state = lock(&self.state);
        state.records.clear();
        for (&net, (record, degraded)) in routable.iter().zip(computed) {
            state.records.insert(net, record);
            stats.record(degraded);
        }
        state.total_wirelength = state.records.values().map(|r| r.wirelength).sum();
        state.dirty.clear();
        state.full_update_performed = true;

        info!(
            "Full routing update: {} nets routed, {} skipped, {} degraded, total wirelength {}",
            stats.updated, stats.skipped, stats.degraded, state.total_wirelength
        );
        stats
    }

    /// Each worker owns one contiguous range of `nets`; results are returned
    /// in input order
    fn compute_parallel(
        &self,
        design: &Design,
        nets: &[NetId],
        workers: usize,
    ) -> Vec<(RoutingRecord, bool)> {
        let chunk_size = nets.len().div_ceil(workers);
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool,
            Err(e) => {
                warn!("Failed to build routing worker pool, updating serially: {}", e);
                return nets
                    .iter()
                    .map(|&net| self.compute_record(design, net))
                    .collect();
            }
        };

        debug!(
            "Routing {} nets on {} workers ({} nets per worker)",
            nets.len(),
            workers,
            chunk_size
        );
        pool.install(|| {
            nets.par_chunks(chunk_size)
                .map(|range| {
                    range
                        .iter()
                        .map(|&net| self.compute_record(design, net))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
        })
        .into_iter()
        .flatten()
        .collect()
    }

    /// Full pass on first use, afterwards only the dirty nets
    pub fn update_routing(&self, design: &Design) -> UpdateStats {
        let mut state = lock(&self.state);
        if !state.full_update_performed {
            drop(state);
            return self.update_routing_full(design);
        }

        let dirty = std::mem::take(&mut state.dirty);
        let mut stats = UpdateStats::default();
        for net in dirty {
            self.refresh_net(&mut state, design, net, &mut stats);
        }
        debug!(
            "Incremental routing update: {} nets routed, {} skipped, total wirelength {}",
            stats.updated, stats.skipped, state.total_wirelength
        );
        stats
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn record(&self, net: NetId) -> Option<RoutingRecord> {
        lock(&self.state).records.get(net).cloned()
    }

    pub fn rc_tree(&self, net: NetId) -> Option<RcTree> {
        lock(&self.state).records.get(net).map(|r| r.rc_tree.clone())
    }

    /// Wirelength of `net`; zero when it has no record
    pub fn net_wirelength(&self, net: NetId) -> Dbu {
        lock(&self.state).records.get(net).map_or(0, |r| r.wirelength)
    }

    pub fn total_wirelength(&self) -> Dbu {
        lock(&self.state).total_wirelength
    }

    pub fn num_records(&self) -> usize {
        lock(&self.state).records.len()
    }

    pub fn is_dirty(&self, net: NetId) -> bool {
        lock(&self.state).dirty.contains(&net)
    }

    /// Dirty nets in the order they were first touched
    pub fn dirty_nets(&self) -> Vec<NetId> {
        lock(&self.state).dirty.iter().copied().collect()
    }

    pub fn full_update_performed(&self) -> bool {
        lock(&self.state).full_update_performed
    }

    /// Point where `pin` joins the routing of `net`. Endpoint pins report
    /// the routing node they hang off.
    pub fn connecting_point(&self, net: NetId, pin: PinId) -> Option<DbuPoint> {
        let state = lock(&self.state);
        let point = state
            .records
            .get(net)
            .and_then(|record| record.rc_tree.connecting_point(pin));
        if point.is_none() {
            warn!("No routing node for pin {} on net {}", pin, net);
        }
        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::{MstEstimationModel, TrunkSteinerModel};
    use crate::extraction::DefaultExtractionModel;
    use parasol_netlist::{ClockNet, Library, PinDirection, TimingSense};

    /// BUF cell with input A at (0, 0) and output Y at (2, 0)
    fn library() -> Library {
        let mut lib = Library::new("lib");
        let buf = lib.add_cell("BUF", 1.0).unwrap();
        let a = lib
            .add_pin(buf, "A", PinDirection::Input, 1.0)
            .unwrap();
        let y = lib
            .add_pin(buf, "Y", PinDirection::Output, 0.0)
            .unwrap();
        lib.set_pin_offset(y, DbuPoint::new(2, 0)).unwrap();
        lib.add_arc(a, y, TimingSense::PositiveUnate).unwrap();
        lib
    }

    fn chain(design: &mut Design, length: usize) -> Vec<NetId> {
        let buf = design.library().find_cell("BUF").unwrap();
        let mut instances = Vec::new();
        for i in 0..length {
            let position = DbuPoint::new(i as Dbu * 10, (i as Dbu % 3) * 5);
            instances.push(design.create_instance(&format!("u{}", i), buf, position).unwrap());
        }
        let mut nets = Vec::new();
        for i in 1..length {
            let net = design.create_net(&format!("w{}", i)).unwrap();
            let y = design.find_instance_pin(instances[i - 1], "Y").unwrap();
            let a = design.find_instance_pin(instances[i], "A").unwrap();
            design.connect(y, net).unwrap();
            design.connect(a, net).unwrap();
            nets.push(net);
        }
        nets
    }

    fn start(design: &mut Design, config: EstimatorConfig) -> RoutingEstimator {
        RoutingEstimator::builder(config, Arc::new(ClockNet::none()))
            .estimation_model(Arc::new(TrunkSteinerModel))
            .extraction_model(Arc::new(DefaultExtractionModel::default()))
            .start(design)
            .unwrap()
    }

    #[test]
    fn test_first_update_is_full() {
        let mut design = Design::new("d", library());
        let nets = chain(&mut design, 4);
        let estimator = start(&mut design, EstimatorConfig::default());

        assert!(!estimator.full_update_performed());
        let stats = estimator.update_routing(&design);
        assert!(estimator.full_update_performed());
        assert_eq!(stats.updated, 3);
        let sum: Dbu = nets.iter().map(|&n| estimator.net_wirelength(n)).sum();
        assert_eq!(estimator.total_wirelength(), sum);
    }

    #[test]
    fn test_move_marks_instance_nets_dirty() {
        let mut design = Design::new("d", library());
        let nets = chain(&mut design, 3);
        let estimator = start(&mut design, EstimatorConfig::default());
        estimator.update_routing(&design);

        let u1 = design.find_instance("u1").unwrap();
        design.move_instance(u1, DbuPoint::new(100, 100)).unwrap();
        assert_eq!(estimator.dirty_nets(), nets);

        let stats = estimator.update_routing(&design);
        assert_eq!(stats.updated, 2);
        assert!(estimator.dirty_nets().is_empty());
        let sum: Dbu = nets.iter().map(|&n| estimator.net_wirelength(n)).sum();
        assert_eq!(estimator.total_wirelength(), sum);
    }

    #[test]
    fn test_net_removal_subtracts_contribution() {
        let mut design = Design::new("d", library());
        let nets = chain(&mut design, 3);
        let estimator = start(&mut design, EstimatorConfig::default());
        estimator.update_routing(&design);

        let remaining = estimator.net_wirelength(nets[1]);
        design.remove_net(nets[0]).unwrap();
        assert_eq!(estimator.total_wirelength(), remaining);
        assert!(estimator.record(nets[0]).is_none());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let mut design = Design::new("d", library());
        let nets = chain(&mut design, 40);
        let serial = start(
            &mut design,
            EstimatorConfig {
                parallel: false,
                ..Default::default()
            },
        );
        let parallel = start(
            &mut design,
            EstimatorConfig {
                parallel: true,
                max_workers: 4,
                ..Default::default()
            },
        );
        serial.update_routing_full(&design);
        parallel.update_routing_full(&design);

        assert_eq!(serial.total_wirelength(), parallel.total_wirelength());
        for net in nets {
            assert_eq!(serial.record(net), parallel.record(net));
        }
    }

    #[test]
    fn test_missing_strategies() {
        let mut design = Design::new("d", library());
        let nets = chain(&mut design, 2);

        let strict = RoutingEstimator::builder(
            EstimatorConfig {
                require_strategies: true,
                ..Default::default()
            },
            Arc::new(ClockNet::none()),
        )
        .start(&mut design);
        assert!(matches!(strict, Err(RoutingError::MissingStrategy("estimation"))));

        let permissive = RoutingEstimator::builder(EstimatorConfig::default(), Arc::new(ClockNet::none()))
            .estimation_model(Arc::new(MstEstimationModel))
            .start(&mut design)
            .unwrap();
        let stats = permissive.update_routing_full(&design);
        assert_eq!(stats.degraded, 1);
        assert!(permissive.net_wirelength(nets[0]) > 0);
        assert!(permissive.rc_tree(nets[0]).unwrap().is_empty());
    }

    #[test]
    fn test_stop_detaches_observer() {
        let mut design = Design::new("d", library());
        chain(&mut design, 2);
        let estimator = start(&mut design, EstimatorConfig::default());
        assert_eq!(design.num_observers(), 1);
        estimator.stop(&mut design);
        assert_eq!(design.num_observers(), 0);
    }
}
