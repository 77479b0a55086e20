//! Redis backend integration tests.
//!
//! Run with: `cargo test -p ishorts-queue --test redis_tests -- --ignored`

use std::time::Duration;

use futures::StreamExt;

use ishorts_models::VideoId;
use ishorts_queue::{
    decode, publish_series_created, Enqueuer, QueueBackend, RedisQueue, SeriesCreated, TitleTask,
    SERIES_CREATED_CHANNEL,
};

fn test_queue_name(suffix: &str) -> String {
    format!("q_test_{}_{}", suffix, std::process::id())
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_push_pop_cycle() {
    dotenvy::dotenv().ok();

    let redis = RedisQueue::from_env().expect("Failed to create queue");
    redis.ping().await.expect("Redis not reachable");

    let queue = test_queue_name("cycle");
    redis.push(&queue, "first".to_string()).await.unwrap();
    redis.push(&queue, "second".to_string()).await.unwrap();
    assert_eq!(redis.len(&queue).await.unwrap(), 2);

    let first = redis
        .pop(&[queue.as_str()], Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.queue, queue);
    assert_eq!(first.payload, "first");

    let second = redis
        .pop(&[queue.as_str()], Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.payload, "second");
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_pop_times_out() {
    dotenvy::dotenv().ok();

    let redis = RedisQueue::from_env().expect("Failed to create queue");
    let queue = test_queue_name("empty");

    let popped = redis
        .pop(&[queue.as_str()], Duration::from_secs(1))
        .await
        .unwrap();
    assert!(popped.is_none());
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_enqueue_task() {
    dotenvy::dotenv().ok();

    let redis = std::sync::Arc::new(RedisQueue::from_env().expect("Failed to create queue"));
    let enqueuer = Enqueuer::new(redis.clone());
    let queue = test_queue_name("task");

    enqueuer
        .enqueue(&queue, &TitleTask { video_id: VideoId(77) })
        .await
        .unwrap();

    let popped = redis
        .pop(&[queue.as_str()], Duration::from_secs(1))
        .await
        .unwrap()
        .unwrap();
    let task: TitleTask = decode(&popped.payload).unwrap();
    assert_eq!(task.video_id, VideoId(77));
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_series_created_pubsub() {
    dotenvy::dotenv().ok();

    let redis = RedisQueue::from_env().expect("Failed to create queue");
    let mut stream = redis.subscribe(SERIES_CREATED_CHANNEL).await.unwrap();

    let message = SeriesCreated {
        series_id: ishorts_models::SeriesId(5),
        posts_per_day: 1,
    };
    publish_series_created(&redis, &message).await.unwrap();

    let payload = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("notification not received")
        .expect("subscription closed");
    assert_eq!(decode::<SeriesCreated>(&payload).unwrap(), message);
}
