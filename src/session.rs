//! Engines wired from a [`ParasolConfig`]

use crate::config::ParasolConfig;
use crate::error::Result;
use log::info;
use parasol_netlist::{Design, Library, Scenario};
use parasol_routing::{DefaultExtractionModel, RoutingEstimator};
use parasol_timing::{DelayEvaluator, LibraryCharacterization, LibraryCharacterizer};
use std::sync::Arc;

/// A routing estimator attached to one design plus a library characterizer,
/// both configured from the same document
pub struct Session {
    config: ParasolConfig,
    estimator: RoutingEstimator,
    characterizer: LibraryCharacterizer,
}

impl Session {
    /// Build the configured strategies and start the routing estimator on
    /// `design`
    pub fn start(
        config: ParasolConfig,
        design: &mut Design,
        scenario: Arc<dyn Scenario>,
    ) -> Result<Self> {
        let mut builder = RoutingEstimator::builder(config.routing.estimator_config(), scenario)
            .maybe_estimation_model(config.routing.estimation_model.build());
        if config.routing.extraction {
            builder = builder.extraction_model(Arc::new(DefaultExtractionModel::new(
                config.extraction.clone(),
            )));
        }
        let estimator = builder.start(design)?;
        let characterizer = LibraryCharacterizer::new(config.characterization.clone());

        info!(
            "Session started on design '{}' with {:?} routing estimation",
            design.name, config.routing.estimation_model
        );
        Ok(Self {
            config,
            estimator,
            characterizer,
        })
    }

    pub fn config(&self) -> &ParasolConfig {
        &self.config
    }

    pub fn estimator(&self) -> &RoutingEstimator {
        &self.estimator
    }

    pub fn characterizer(&self) -> &LibraryCharacterizer {
        &self.characterizer
    }

    /// Bring every routing record up to date
    pub fn update_routing(&self, design: &Design) -> parasol_routing::UpdateStats {
        self.estimator.update_routing(design)
    }

    /// Run the one-time library characterization
    pub fn characterize(
        &mut self,
        library: &Library,
        evaluator: &dyn DelayEvaluator,
    ) -> Result<&LibraryCharacterization> {
        Ok(self.characterizer.run_library_analysis(library, evaluator)?)
    }

    /// Detach the routing estimator from `design`
    pub fn stop(self, design: &mut Design) {
        self.estimator.stop(design);
    }
}
