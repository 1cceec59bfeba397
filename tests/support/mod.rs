// Shared fixtures for the integration tests.
#![allow(dead_code)]

use slash_engine::{Engine, EngineSettings, Impulse, ImpulseChain, Object, ObjectType, Vector, World};
use std::time::Duration;

// Upper bound for any test that waits on the scheduler.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

pub fn arena() -> World {
    World::new(9.8, Vector::new(100.0, 100.0))
}

pub fn creature(id: i32) -> Object {
    Object::new(id, ObjectType::Creature)
        .with_position(Vector::new(50.0, 90.0))
        .with_size(Vector::new(10.0, 10.0))
}

pub fn chain(nodes: &[((f64, f64), f64)]) -> ImpulseChain {
    nodes
        .iter()
        .map(|&((x, y), damping)| Impulse::new(Vector::new(x, y), damping))
        .collect()
}

pub async fn engine_with(world: World) -> Engine {
    let engine = Engine::new(EngineSettings::default());
    engine.set_world(world, Duration::ZERO).await;
    engine
}

// Polls until the scheduler has completed at least `ticks` passes.
pub async fn wait_for_ticks(engine: &Engine, ticks: u64) {
    tokio::time::timeout(WAIT_LIMIT, async {
        while engine.ticks().await < ticks {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("scheduler should keep ticking");
}
