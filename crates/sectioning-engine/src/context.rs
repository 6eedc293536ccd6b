//! Engine context: the catalog, locks, configuration, and collaborators
//! shared by every service.

use std::sync::{Arc, Mutex};

use rand::SeedableRng;
use rand::rngs::StdRng;

use sectioning_core::config::{AppConfig, WeightingMode};
use sectioning_core::traits::clock::{Clock, SystemClock};
use sectioning_entity::catalog::CatalogSnapshot;

use crate::catalog::Catalog;
use crate::deadline::DeadlineChecker;
use crate::lock::LockManager;
use crate::notification::{LogNotifier, Notifier};
use crate::provider::{EnrollmentProvider, LocalProvider};
use crate::resection::weights::{EnrollmentWeighting, StabilityWeighting, UniformWeighting};
use crate::store::EnrollmentStore;
use crate::validator::EnrollmentValidator;

/// Everything an engine operation needs, passed explicitly.
#[derive(Debug)]
pub struct EngineContext {
    /// Current catalog snapshot.
    pub catalog: Arc<Catalog>,
    /// Offering and student locks.
    pub locks: Arc<LockManager>,
    /// System of record.
    pub store: Arc<dyn EnrollmentStore>,
    /// Outside enrollment confirmation.
    pub provider: Arc<dyn EnrollmentProvider>,
    /// Notification sink.
    pub notifier: Arc<dyn Notifier>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Enrollment weighting for the resectioning search.
    pub weighting: Arc<dyn EnrollmentWeighting>,
    /// Loaded configuration.
    pub config: Arc<AppConfig>,
    /// Deadline predicate built from `config.deadlines`.
    pub deadlines: DeadlineChecker,
    /// Validator built from `config.policy`.
    pub validator: EnrollmentValidator,
    rng: Mutex<StdRng>,
}

impl EngineContext {
    /// Creates a context with the local provider, the log notifier, the
    /// system clock, and the configured weighting.
    pub fn new(
        config: AppConfig,
        snapshot: CatalogSnapshot,
        store: Arc<dyn EnrollmentStore>,
    ) -> Self {
        let deadlines = DeadlineChecker::new(config.deadlines.clone());
        let validator = EnrollmentValidator::new(config.policy.clone(), deadlines.clone());
        let weighting: Arc<dyn EnrollmentWeighting> = match config.search.weighting {
            WeightingMode::Stability => {
                Arc::new(StabilityWeighting::new(config.search.weights.clone()))
            }
            WeightingMode::Uniform => Arc::new(UniformWeighting),
        };
        let rng = match config.search.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog: Arc::new(Catalog::new(snapshot)),
            locks: Arc::new(LockManager::new()),
            store,
            provider: Arc::new(LocalProvider),
            notifier: Arc::new(LogNotifier),
            clock: Arc::new(SystemClock),
            weighting,
            config: Arc::new(config),
            deadlines,
            validator,
            rng: Mutex::new(rng),
        }
    }

    /// Replaces the enrollment provider.
    pub fn with_provider(mut self, provider: Arc<dyn EnrollmentProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Replaces the notifier.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the weighting.
    pub fn with_weighting(mut self, weighting: Arc<dyn EnrollmentWeighting>) -> Self {
        self.weighting = weighting;
        self
    }

    /// Runs `f` with the shared tie-breaking random source.
    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        match self.rng.lock() {
            Ok(mut rng) => f(&mut rng),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}
