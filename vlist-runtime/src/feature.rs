use std::collections::BTreeSet;
use std::rc::Rc;

use crate::error::ListError;
use crate::event::EventBus;

/// The fixed stage order enhancers initialize in, replacing the duck-typed mixin composition a
/// naive port would reach for: every enhancer is tagged with the single stage it belongs to, and
/// the pipeline runs stages in this order regardless of registration order.
pub const STAGE_ORDER: &[&str] = &[
    "base",
    "events",
    "element",
    "viewport",
    "lifecycle",
    "api",
    "selection",
    "layout",
    "search",
    "filter",
    "stats",
    "velocity",
    "scroll-restore",
];

fn stage_index(stage: &str) -> usize {
    STAGE_ORDER
        .iter()
        .position(|s| *s == stage)
        .unwrap_or(STAGE_ORDER.len())
}

/// One capability contributed by a feature enhancer.
///
/// `provides`/`requires` name the small vocabulary a stage publishes or depends on (e.g.
/// `selection.rs` provides `"selection"`; `stats.rs` requires `"viewport"`). `init` is async so a
/// stage can await a single micro-yield before running, guaranteeing it observes the previous
/// stage's registered state rather than racing it.
///
/// Not `Send`/`Sync`-bound: spec's concurrency model is single-threaded cooperative (no
/// shared-memory threads), so capabilities are held as `Rc<dyn Capability>` rather than `Arc`,
/// matching the enhancer fields' own `Rc<RefCell<_>>` storage in `List`.
#[async_trait::async_trait(?Send)]
pub trait Capability {
    fn stage(&self) -> &'static str;
    fn provides(&self) -> &'static [&'static str] {
        &[]
    }
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }
    async fn init(&self, bus: &EventBus) -> Result<(), ListError>;
}

/// The pre-enhancer stages (`base`, `events`, `element`, `viewport`, `lifecycle`, `api`) that
/// `List::new` always provides before any enhancer initializes, so `selection`'s `requires:
/// ["api"]` is always satisfied.
#[derive(Default)]
pub struct CoreCapability;

#[async_trait::async_trait(?Send)]
impl Capability for CoreCapability {
    fn stage(&self) -> &'static str {
        "base"
    }
    fn provides(&self) -> &'static [&'static str] {
        &["base", "events", "element", "viewport", "lifecycle", "api"]
    }
    async fn init(&self, _bus: &EventBus) -> Result<(), ListError> {
        Ok(())
    }
}

/// Runs a set of registered [`Capability`]s in [`STAGE_ORDER`], validating that every
/// `requires` name was `provides`d by a strictly earlier stage.
#[derive(Default)]
pub struct Pipeline {
    capabilities: Vec<Rc<dyn Capability>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, capability: Rc<dyn Capability>) -> &mut Self {
        self.capabilities.push(capability);
        self
    }

    /// Initializes every registered capability in stage order, one micro-yield apart.
    ///
    /// A capability whose `requires` were not provided by an earlier stage is a misconfigured
    /// pipeline (a programmer error, not a runtime condition) — it is logged once and skipped
    /// rather than aborting the whole pipeline.
    pub async fn run(&self, bus: &EventBus) -> Result<(), ListError> {
        let mut ordered: Vec<&Rc<dyn Capability>> = self.capabilities.iter().collect();
        ordered.sort_by_key(|c| stage_index(c.stage()));

        let mut provided: BTreeSet<&'static str> = BTreeSet::new();
        for capability in ordered {
            let missing: Vec<&'static str> = capability
                .requires()
                .iter()
                .copied()
                .filter(|req| !provided.contains(req))
                .collect();
            if !missing.is_empty() {
                vwarn!(
                    "capability {:?} skipped: missing requirement(s) {:?}",
                    capability.stage(),
                    missing
                );
                continue;
            }

            // One micro-yield so this stage genuinely observes the previous stage's effects
            // rather than running back-to-back in the same poll.
            futures::future::ready(()).await;

            capability.init(bus).await?;
            for provided_name in capability.provides() {
                provided.insert(provided_name);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
