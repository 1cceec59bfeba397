// Engine: owns the current world and drives it from a background scheduler.

use crate::domain::{Clock, Impulse, NEGLIGIBLE, Object, ObjectId, Vector, World};
use crate::interface_adapters::clock::SystemClock;
use crate::interface_adapters::codec::{self, CodecError};
use crate::use_cases::scheduler::{self, SchedulerHandle};
use crate::use_cases::types::EngineSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, trace};

#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) world: Option<World>,
    pub(crate) last_update: Option<Instant>,
    pub(crate) ticks: u64,
}

// State shared with the scheduler tasks.
pub(crate) struct Shared {
    pub(crate) state: RwLock<EngineState>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) settings: EngineSettings,
}

/// Handle to a simulation world and its tick scheduler.
///
/// All methods are safe to call concurrently. Mutations on a missing world or
/// object are silent no-ops. Dropping the engine stops its scheduler.
pub struct Engine {
    shared: Arc<Shared>,
    // Locked before `shared.state` whenever both are needed.
    scheduler: Mutex<Option<SchedulerHandle>>,
}

impl Engine {
    pub fn new(settings: EngineSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: EngineSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(EngineState::default()),
                clock,
                settings,
            }),
            scheduler: Mutex::new(None),
        }
    }

    /// Starts periodic integration every `tick_interval`.
    ///
    /// Does nothing when already running or when no world exists.
    ///
    /// # Panics
    ///
    /// Panics if `tick_interval` is zero.
    pub async fn run(&self, tick_interval: Duration) {
        assert!(!tick_interval.is_zero(), "tick interval must be positive");

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_some() {
            debug!("scheduler already running");
            return;
        }
        {
            let mut state = self.shared.state.write().await;
            if state.world.is_none() {
                debug!("no world; scheduler not started");
                return;
            }
            state.last_update = Some(self.shared.clock.now());
        }

        *scheduler = Some(scheduler::spawn(Arc::clone(&self.shared), tick_interval));
        info!(
            tick_ms = u64::try_from(tick_interval.as_millis()).unwrap_or(u64::MAX),
            "scheduler started"
        );
    }

    /// Stops the scheduler. Once this returns no further pass runs.
    pub async fn stop(&self) {
        let mut scheduler = self.scheduler.lock().await;
        let Some(handle) = scheduler.take() else {
            return;
        };
        handle.shutdown().await;
        info!("scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }

    /// Instant of the most recent pass, start or world replacement.
    pub async fn last_update(&self) -> Option<Instant> {
        self.shared.state.read().await.last_update
    }

    /// Number of scheduled passes that ran over a world.
    pub async fn ticks(&self) -> u64 {
        self.shared.state.read().await.ticks
    }

    /// Replaces any current world with an empty one.
    pub async fn create_world(&self, gravity: f64, boundary: Vector) {
        let mut state = self.shared.state.write().await;
        state.world = Some(World::new(gravity, boundary));
        info!(gravity, width = boundary.x, height = boundary.y, "world created");
    }

    /// Replaces the current world and extrapolates it by the scaled `rtt`.
    pub async fn set_world(&self, mut world: World, rtt: Duration) {
        let mut guard = self.shared.state.write().await;
        let state = &mut *guard;

        if !rtt.is_zero() {
            let elapsed = rtt.as_secs_f64() * self.shared.settings.rtt_scale;
            scheduler::integrate(&mut world, elapsed, state.ticks);
        }
        debug!(objects = world.len(), rtt_ms = rtt.as_secs_f64() * 1000.0, "world set");
        state.world = Some(world);
        state.last_update = Some(self.shared.clock.now());
    }

    pub async fn clear_world(&self) {
        let mut state = self.shared.state.write().await;
        if state.world.take().is_some() {
            debug!("world cleared");
        }
    }

    /// Inserts or fully replaces an object keyed by its id.
    pub async fn upsert_object(&self, object: Object) {
        self.upsert_objects(std::iter::once(object)).await;
    }

    pub async fn upsert_objects(&self, objects: impl IntoIterator<Item = Object>) {
        let mut state = self.shared.state.write().await;
        let Some(world) = state.world.as_mut() else {
            trace!("upsert ignored; no world");
            return;
        };
        for object in objects {
            world.upsert(object);
        }
    }

    /// Applies an impulse to an object.
    ///
    /// With `damping` at or below [`NEGLIGIBLE`] the direction is added to the
    /// velocity at once; otherwise a new impulse becomes the chain head.
    /// Non-finite damping never decays away and is ignored.
    pub async fn add_impulse(&self, id: ObjectId, direction: Vector, damping: f64) {
        if !damping.is_finite() {
            trace!(object_id = id, damping, "impulse ignored; damping not finite");
            return;
        }
        self.update_object(id, |object| {
            if damping <= NEGLIGIBLE {
                object.velocity += direction;
            } else {
                object.impulses.push_front(Impulse::new(direction, damping));
            }
        })
        .await;
    }

    pub async fn set_velocity(&self, id: ObjectId, velocity: Vector) {
        self.update_object(id, |object| object.velocity = velocity)
            .await;
    }

    pub async fn set_position(&self, id: ObjectId, position: Vector) {
        self.update_object(id, |object| object.position = position)
            .await;
    }

    pub async fn set_anchor(&self, id: ObjectId, anchor: Vector) {
        self.update_object(id, |object| object.anchor = anchor).await;
    }

    pub async fn remove_object(&self, id: ObjectId) {
        self.remove_objects([id]).await;
    }

    pub async fn remove_objects(&self, ids: impl IntoIterator<Item = ObjectId>) {
        let mut state = self.shared.state.write().await;
        let Some(world) = state.world.as_mut() else {
            return;
        };
        for id in ids {
            if world.remove(id).is_none() {
                trace!(object_id = id, "remove ignored; unknown object");
            }
        }
    }

    /// Copy of the object with `id`, if any.
    pub async fn get_object(&self, id: ObjectId) -> Option<Object> {
        let state = self.shared.state.read().await;
        state.world.as_ref()?.object(id).cloned()
    }

    pub async fn has_world(&self) -> bool {
        self.shared.state.read().await.world.is_some()
    }

    /// Copy of the whole world, if any.
    pub async fn get_world(&self) -> Option<World> {
        self.shared.state.read().await.world.clone()
    }

    /// Binary snapshot of the current world.
    pub async fn encode_world(&self) -> Option<Vec<u8>> {
        let state = self.shared.state.read().await;
        state.world.as_ref().map(codec::encode)
    }

    /// Decodes `bytes` and applies the result like [`Engine::set_world`].
    ///
    /// Empty input clears the world. A decode failure leaves the engine untouched.
    pub async fn apply_snapshot(&self, bytes: &[u8], rtt: Duration) -> Result<(), CodecError> {
        match codec::decode(bytes)? {
            Some(world) => self.set_world(world, rtt).await,
            None => self.clear_world().await,
        }
        Ok(())
    }

    async fn update_object(&self, id: ObjectId, apply: impl FnOnce(&mut Object)) {
        let mut state = self.shared.state.write().await;
        match state.world.as_mut().and_then(|world| world.object_mut(id)) {
            Some(object) => apply(object),
            None => trace!(object_id = id, "update ignored; unknown object"),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineSettings::default())
    }
}
