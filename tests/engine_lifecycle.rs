mod support;

use slash_engine::{Object, ObjectType, Vector};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn when_engine_runs_then_objects_fall_and_stop_on_the_floor() {
    let engine = support::engine_with(support::arena().with_objects([support::creature(1)])).await;

    engine.run(Duration::from_millis(2)).await;
    tokio::time::timeout(support::WAIT_LIMIT, async {
        loop {
            let object = engine.get_object(1).await.expect("creature should exist");
            if object.position.y == 0.0 {
                break object;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("creature should land");
    engine.stop().await;

    let object = engine.get_object(1).await.expect("creature should exist");
    assert_eq!(object.position.y, 0.0);
    assert!(object.velocity.y <= 0.0);
    assert_eq!(object.position.x, 50.0);
}

#[tokio::test]
async fn when_engine_is_stopped_then_no_more_passes_run() {
    let engine = support::engine_with(support::arena().with_objects([support::creature(1)])).await;

    engine.run(Duration::from_millis(1)).await;
    support::wait_for_ticks(&engine, 3).await;
    engine.stop().await;
    let ticks = engine.ticks().await;
    let world = engine.get_world().await;

    tokio::time::sleep(Duration::from_millis(25)).await;

    assert!(!engine.is_running().await);
    assert_eq!(engine.ticks().await, ticks);
    assert_eq!(engine.get_world().await, world);
}

#[tokio::test]
async fn when_engine_restarts_then_ticking_resumes() {
    let engine = support::engine_with(support::arena()).await;

    engine.run(Duration::from_millis(1)).await;
    support::wait_for_ticks(&engine, 1).await;
    engine.stop().await;
    let ticks = engine.ticks().await;

    engine.run(Duration::from_millis(1)).await;
    support::wait_for_ticks(&engine, ticks + 2).await;
    engine.stop().await;
}

#[tokio::test]
async fn when_world_is_cleared_while_running_then_scheduler_survives() {
    let engine = support::engine_with(support::arena()).await;
    engine.run(Duration::from_millis(1)).await;

    engine.clear_world().await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(engine.is_running().await);

    engine.create_world(1.0, Vector::new(10.0, 10.0)).await;
    let ticks = engine.ticks().await;
    support::wait_for_ticks(&engine, ticks + 1).await;
    engine.stop().await;
}

#[tokio::test]
async fn when_objects_are_mutated_concurrently_then_every_write_lands() {
    let engine = Arc::new(support::engine_with(support::arena()).await);
    engine.run(Duration::from_millis(1)).await;

    let writers: Vec<_> = (0..8)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                for i in 0..25 {
                    let id = worker * 100 + i;
                    engine
                        .upsert_object(
                            Object::new(id, ObjectType::Terrain).with_position(Vector::new(1.0, 1.0)),
                        )
                        .await;
                }
            })
        })
        .collect();
    for writer in writers {
        writer.await.expect("writer task should finish");
    }
    engine.stop().await;

    let world = engine.get_world().await.expect("world should exist");
    assert_eq!(world.len(), 200);
    assert!(world.objects().all(|o| o.position == Vector::new(1.0, 1.0)));
}

#[tokio::test]
async fn when_objects_are_removed_then_lookups_miss() {
    let engine = support::engine_with(
        support::arena().with_objects([support::creature(1), support::creature(2)]),
    )
    .await;

    engine.remove_objects([1, 2]).await;

    assert_eq!(engine.get_object(1).await, None);
    assert_eq!(engine.get_object(2).await, None);
}

#[tokio::test]
async fn when_impulse_is_stored_then_scheduler_consumes_it() {
    let engine = support::engine_with(support::arena().with_objects([Object::new(
        5,
        ObjectType::Effect,
    )
    .with_gravity_factor(0.0)]))
    .await;

    engine.add_impulse(5, Vector::new(10.0, 0.0), 0.011).await;
    engine.run(Duration::from_millis(1)).await;
    tokio::time::timeout(support::WAIT_LIMIT, async {
        while engine
            .get_object(5)
            .await
            .is_some_and(|o| !o.impulses.is_empty())
        {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .expect("impulse should decay away");
    engine.stop().await;

    let object = engine.get_object(5).await.expect("effect should exist");
    assert!(object.velocity.x > 0.0);
}
