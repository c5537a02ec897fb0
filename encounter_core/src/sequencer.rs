//! # Encounter Sequencer
//!
//! Single-flight arbitration in front of the assembler. At most one
//! encounter is generated at a time (`&mut self`), and a minimum interval
//! separates two freshly generated encounters. Inside that interval a request
//! for the same day gets the encounter already issued; any other request is
//! rejected with [`SequencerError::CooldownRejected`].
//!
//! State machine: `Idle -> Generating -> Issued -> Idle`. `Issued` returns to
//! `Idle` once the cooldown has elapsed or is reset.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use checkpoint_rules::ContentCatalog;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::assembler::EncounterAssembler;
use crate::config::EngineConfig;
use crate::encounter::Encounter;
use crate::error::{ConfigError, SequencerError};
use crate::scenario_selector::ScenarioSelector;

/// Source of monotonic time for cooldowns.
pub trait GameClock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl GameClock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Host-driven clock. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(duration_millis(by), Ordering::SeqCst);
    }

    /// Jump to `at`.
    pub fn set(&self, at: Duration) {
        self.millis.store(duration_millis(at), Ordering::SeqCst);
    }
}

impl GameClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    Generating,
    Issued,
}

/// What kind of encounter to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterRequest {
    pub want_valid: bool,
    pub want_story: Option<String>,
}

impl EncounterRequest {
    /// An approvable encounter.
    pub fn valid() -> Self {
        Self {
            want_valid: true,
            want_story: None,
        }
    }

    /// An encounter that should be denied.
    pub fn invalid() -> Self {
        Self {
            want_valid: false,
            want_story: None,
        }
    }

    /// A story encounter for `tag`. The scenario decides the verdict.
    pub fn story(tag: impl Into<String>) -> Self {
        Self {
            want_valid: true,
            want_story: Some(tag.into()),
        }
    }
}

/// Result of a successful request.
#[derive(Debug, Clone)]
pub struct Issued {
    pub encounter: Arc<Encounter>,
    /// True when the already-issued encounter was handed out again.
    pub reused: bool,
}

/// Decides the shape of the next encounter from the configured ratios.
#[derive(Debug, Clone, Copy)]
pub struct EncounterPlanner {
    valid_ratio: f64,
    story_chance: f64,
}

impl EncounterPlanner {
    /// Create a planner from the configured ratios.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            valid_ratio: config.valid_ratio.clamp(0.0, 1.0),
            story_chance: config.story_chance.clamp(0.0, 1.0),
        }
    }

    /// Story tags are only proposed when the selector can still serve one today.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        day: u32,
        selector: &ScenarioSelector,
        rng: &mut R,
    ) -> EncounterRequest {
        let want_valid = rng.gen_bool(self.valid_ratio);
        let want_story = if rng.gen_bool(self.story_chance) {
            selector.available_story_tags(day).choose(rng).cloned()
        } else {
            None
        };
        EncounterRequest {
            want_valid,
            want_story,
        }
    }
}

/// Rate-limited, single-flight front door to the assembler.
#[derive(Debug)]
pub struct EncounterSequencer<C: GameClock = SystemClock> {
    assembler: EncounterAssembler,
    planner: EncounterPlanner,
    clock: C,
    rng: ChaCha8Rng,
    cooldown: Duration,
    state: SequencerState,
    last_issued_at: Option<Duration>,
    current: Option<Arc<Encounter>>,
}

impl<C: GameClock> EncounterSequencer<C> {
    /// Validates `config`; seeds from `config.seed` or from entropy.
    pub fn new(
        catalog: Arc<ContentCatalog>,
        config: EngineConfig,
        clock: C,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let assembler = EncounterAssembler::new(catalog, config);
        Ok(Self::with_assembler(assembler, clock))
    }

    /// Create a sequencer around an existing assembler.
    pub fn with_assembler(assembler: EncounterAssembler, clock: C) -> Self {
        let config = assembler.config();
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            planner: EncounterPlanner::new(config),
            cooldown: config.cooldown(),
            assembler,
            clock,
            rng,
            state: SequencerState::Idle,
            last_issued_at: None,
            current: None,
        }
    }

    /// Plan and issue the next encounter for `day`.
    pub fn request_next(&mut self, day: u32) -> Result<Issued, SequencerError> {
        let now = self.clock.now();
        if let Some(outcome) = self.check_cooldown(day, now) {
            return outcome;
        }
        let request = self
            .planner
            .plan(day, self.assembler.selector(), &mut self.rng);
        Ok(self.generate(day, &request, now))
    }

    /// Issue an encounter of an explicit shape.
    pub fn request(
        &mut self,
        day: u32,
        request: &EncounterRequest,
    ) -> Result<Issued, SequencerError> {
        let now = self.clock.now();
        if let Some(outcome) = self.check_cooldown(day, now) {
            return outcome;
        }
        Ok(self.generate(day, request, now))
    }

    /// Allow the next request to generate immediately.
    pub fn reset_cooldown(&mut self) {
        debug!("cooldown reset");
        self.last_issued_at = None;
        self.state = SequencerState::Idle;
    }

    /// Record an issuance made at `at`, starting a cooldown from there.
    pub fn record_issued(&mut self, at: Duration) {
        self.last_issued_at = Some(at);
        self.state = SequencerState::Issued;
    }

    /// Current state. `Issued` reads as `Idle` once the cooldown elapsed.
    pub fn state(&self) -> SequencerState {
        match self.state {
            SequencerState::Issued if self.cooldown_remaining(self.clock.now()).is_none() => {
                SequencerState::Idle
            }
            state => state,
        }
    }

    /// Earliest time a fresh encounter can be generated.
    pub fn ready_at(&self) -> Duration {
        self.last_issued_at
            .map_or(Duration::ZERO, |at| at.saturating_add(self.cooldown))
    }

    /// The most recently issued encounter.
    pub fn current(&self) -> Option<&Arc<Encounter>> {
        self.current.as_ref()
    }

    /// Get the assembler.
    pub fn assembler(&self) -> &EncounterAssembler {
        &self.assembler
    }

    /// Get the assembler mutably.
    pub fn assembler_mut(&mut self) -> &mut EncounterAssembler {
        &mut self.assembler
    }

    /// Get the clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn cooldown_remaining(&self, now: Duration) -> Option<Duration> {
        let elapsed = now.saturating_sub(self.last_issued_at?);
        (elapsed < self.cooldown).then(|| self.cooldown - elapsed)
    }

    /// `Some` when the cooldown decides the outcome.
    fn check_cooldown(
        &mut self,
        day: u32,
        now: Duration,
    ) -> Option<Result<Issued, SequencerError>> {
        let Some(remaining) = self.cooldown_remaining(now) else {
            self.state = SequencerState::Idle;
            return None;
        };
        match &self.current {
            Some(current) if current.day == day => {
                debug!(encounter = %current.id, ?remaining, "reusing issued encounter");
                Some(Ok(Issued {
                    encounter: Arc::clone(current),
                    reused: true,
                }))
            }
            _ => {
                debug!(day, ?remaining, "encounter request rejected during cooldown");
                Some(Err(SequencerError::CooldownRejected { remaining }))
            }
        }
    }

    fn generate(&mut self, day: u32, request: &EncounterRequest, now: Duration) -> Issued {
        self.state = SequencerState::Generating;
        let encounter = Arc::new(self.assembler.assemble(
            day,
            request.want_valid,
            request.want_story.as_deref(),
            &mut self.rng,
        ));
        info!(
            encounter = %encounter.id,
            day,
            story = request.want_story.as_deref().unwrap_or("-"),
            "issued encounter"
        );
        self.current = Some(Arc::clone(&encounter));
        self.record_issued(now);
        Issued {
            encounter,
            reused: false,
        }
    }
}

/// Thread-safe handle for hosts that call in from several threads.
///
/// Requests are serialized through one mutex; a late caller sees either the
/// issued encounter or the cooldown rejection.
#[derive(Debug)]
pub struct SharedSequencer<C: GameClock = SystemClock> {
    inner: Arc<Mutex<EncounterSequencer<C>>>,
}

impl<C: GameClock> Clone for SharedSequencer<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: GameClock> SharedSequencer<C> {
    /// Share `sequencer` behind a mutex.
    pub fn new(sequencer: EncounterSequencer<C>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sequencer)),
        }
    }

    pub fn request_next(&self, day: u32) -> Result<Issued, SequencerError> {
        self.lock().request_next(day)
    }

    pub fn request(&self, day: u32, request: &EncounterRequest) -> Result<Issued, SequencerError> {
        self.lock().request(day, request)
    }

    pub fn reset_cooldown(&self) {
        self.lock().reset_cooldown();
    }

    pub fn record_issued(&self, at: Duration) {
        self.lock().record_issued(at);
    }

    pub fn state(&self) -> SequencerState {
        self.lock().state()
    }

    /// Run `f` with exclusive access to the sequencer.
    pub fn with<T>(&self, f: impl FnOnce(&mut EncounterSequencer<C>) -> T) -> T {
        f(&mut self.lock())
    }

    // A panic mid-request leaves no half-built encounter behind, so the
    // poisoned state is still usable.
    fn lock(&self) -> MutexGuard<'_, EncounterSequencer<C>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
