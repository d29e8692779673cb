use std::sync::{Arc, Mutex};
use std::time::Duration;
use wayline::adapters::inbound::{BroadcastStateStream, InMemoryIoDevice};
use wayline::adapters::outbound::{channel_transport, init_buffered_sink, init_noop_sink, MultiSink};
use wayline::common::IoValue;
use wayline::domains::execution::{
    IoDevice, MotionGroupState, MovementRequest, MovementResponse, PauseMovementRequest,
    StartMovementResponse, StateStreamFactory,
};
use wayline::domains::observer::{DynEventSink, MotionEvent, MotionEventKind, MotionEventSink};
use wayline::Config;

fn idle_state() -> MotionGroupState {
    MotionGroupState {
        standstill: true,
        execute: None,
        joints: vec![0.0; 6],
        tcp_pose: None,
    }
}

struct RecordingSink {
    events: Mutex<Vec<MotionEvent>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
        })
    }

    fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

impl MotionEventSink for RecordingSink {
    fn publish(&self, event: &MotionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn position_event() -> MotionEvent {
    MotionEvent::now(MotionEventKind::TrajectoryPosition {
        trajectory_id: "traj-1".to_string(),
        location: 1.5,
    })
}

#[tokio::test]
async fn config_defaults_match_the_protocol_contract() {
    let config = Config::default();
    assert_eq!(config.planning.wait_sample_interval(), Duration::from_millis(50));
    assert_eq!(
        config.execution.monitor_start_timeout(),
        Duration::from_secs(5)
    );
    assert_eq!(config.cursor.publish_interval(), Duration::from_millis(500));
}

#[tokio::test]
async fn config_loads_from_toml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wayline.toml");
    std::fs::write(
        &path,
        r#"
[planning]
wait_sample_interval_ms = 20

[execution]
monitor_start_timeout_ms = 1000
channel_capacity = 8

[cursor]
publish_interval_ms = 100
queue_capacity = 8
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).await.unwrap();
    assert_eq!(config.planning.wait_sample_interval(), Duration::from_millis(20));
    assert_eq!(config.execution.channel_capacity, 8);
    assert_eq!(config.cursor.publish_interval(), Duration::from_millis(100));
}

#[tokio::test]
async fn config_from_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("does-not-exist.toml");
    assert!(Config::from_file(&path).await.is_err());
}

#[tokio::test]
async fn every_subscription_gets_an_independent_stream() {
    let stream = BroadcastStateStream::new(16);
    let mut first = stream.subscribe();
    let mut second = stream.subscribe();

    stream.publish(idle_state());

    assert!(first.recv().await.unwrap().standstill);
    assert!(second.recv().await.unwrap().standstill);
}

#[tokio::test]
async fn dropped_subscription_does_not_affect_the_other() {
    let stream = BroadcastStateStream::new(16);
    let first = stream.subscribe();
    let mut second = stream.subscribe();
    drop(first);

    stream.publish(idle_state());
    assert!(second.recv().await.is_some());
}

#[tokio::test]
async fn in_memory_io_round_trips_values() {
    let device = InMemoryIoDevice::new();
    device.write("gripper", IoValue::Bool(true)).await.unwrap();
    device.write("speed", IoValue::Float(0.5)).await.unwrap();

    assert_eq!(device.read("gripper").await.unwrap(), IoValue::Bool(true));
    assert_eq!(device.read("speed").await.unwrap(), IoValue::Float(0.5));
    assert!(device.read("unknown").await.is_err());
}

#[tokio::test]
async fn channel_transport_moves_messages_both_ways() {
    let (transport, mut endpoint) = channel_transport(4);
    let mut response_rx = transport.response_rx;

    transport
        .request_tx
        .send(MovementRequest::Pause(PauseMovementRequest {}))
        .await
        .unwrap();
    assert!(matches!(
        endpoint.request_rx.recv().await,
        Some(MovementRequest::Pause(_))
    ));

    endpoint
        .response_tx
        .send(MovementResponse::Start(StartMovementResponse {}))
        .await
        .unwrap();
    assert!(matches!(
        response_rx.recv().await,
        Some(MovementResponse::Start(_))
    ));
}

#[tokio::test]
async fn multi_sink_forwards_to_both_sinks() {
    let primary = RecordingSink::new();
    let secondary = RecordingSink::new();
    let multi = MultiSink::new(
        primary.clone() as DynEventSink,
        Some(secondary.clone() as DynEventSink),
    );

    multi.publish(&position_event());
    assert_eq!(primary.count(), 1);
    assert_eq!(secondary.count(), 1);
}

#[tokio::test]
async fn multi_sink_without_secondary_only_hits_primary() {
    let primary = RecordingSink::new();
    let multi = MultiSink::new(primary.clone() as DynEventSink, None);

    multi.publish(&position_event());
    multi.publish(&position_event());
    assert_eq!(primary.count(), 2);
}

#[tokio::test]
async fn buffered_sink_forwards_from_a_background_task() {
    let bridge = RecordingSink::new();
    let buffered = init_buffered_sink(bridge.clone() as DynEventSink, 8);

    buffered.publish(&position_event());
    buffered.publish(&position_event());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(bridge.count(), 2);
}

#[tokio::test]
async fn noop_sink_swallows_events() {
    let sink = init_noop_sink();
    sink.publish(&position_event());
}
