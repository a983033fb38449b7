use super::*;
use crate::{
    BankConfig, CallRequest, CarEvent, CarId, DispatchChannel, Error, EventSink, FloorIndex,
};
use core::time::Duration;
use std::sync::Arc;
use tokio::{
    sync::mpsc,
    time::{Instant, sleep, timeout},
};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_millis(500);

fn bank(num_cars: usize, num_floors: FloorIndex) -> BankConfig {
    BankConfig {
        num_cars,
        num_floors,
        floor_tick: TICK,
        poll_timeout: Duration::from_millis(500),
        shutdown_timeout: Duration::from_secs(3),
    }
}

fn call(origin: FloorIndex, destination: FloorIndex) -> CallRequest {
    CallRequest::new(origin, destination, 10).unwrap()
}

struct Harness {
    pool: CarPool,
    channel: Arc<DispatchChannel>,
    events: mpsc::UnboundedReceiver<CarEvent>,
}

fn launch(config: BankConfig, calls: &[CallRequest]) -> Harness {
    let channel = Arc::new(DispatchChannel::new());
    for &request in calls {
        channel.push(request).unwrap();
    }
    let (tx, events) = mpsc::unbounded_channel();
    let pool = CarPool::spawn(
        config,
        Arc::clone(&channel),
        Arc::new(tx),
        CancellationToken::new(),
    )
    .unwrap();
    Harness {
        pool,
        channel,
        events,
    }
}

async fn collect_until_dropoffs(
    events: &mut mpsc::UnboundedReceiver<CarEvent>,
    dropoffs: usize,
) -> Vec<CarEvent> {
    let mut seen = Vec::new();
    let mut remaining = dropoffs;
    while remaining > 0 {
        let event = timeout(Duration::from_secs(3600), events.recv())
            .await
            .expect("cars stopped making progress")
            .expect("event sink closed");
        if matches!(event, CarEvent::DroppedOff { .. }) {
            remaining -= 1;
        }
        seen.push(event);
    }
    seen
}

/// Replays one car's events, checking single-floor steps and strictly
/// alternating pickups and dropoffs. Returns the trips it completed.
fn replay_car(events: &[CarEvent], car: CarId) -> Vec<(FloorIndex, FloorIndex)> {
    let mut floor = 1;
    let mut carrying = None;
    let mut trips = Vec::new();

    for event in events.iter().filter(|e| e.car() == Some(car)) {
        match *event {
            CarEvent::Arrived { floor: next, .. } => {
                assert_eq!(next.abs_diff(floor), 1, "car {car} jumped {floor} -> {next}");
                floor = next;
            }
            CarEvent::PickedUp { floor: at, .. } => {
                assert_eq!(at, floor);
                assert!(carrying.is_none(), "car {car} started two cycles at once");
                carrying = Some(at);
            }
            CarEvent::DroppedOff { floor: at, .. } => {
                assert_eq!(at, floor);
                let origin = carrying.take().expect("dropoff without pickup");
                trips.push((origin, at));
            }
            CarEvent::CallRequested { .. } => unreachable!("cars never request calls"),
        }
    }

    assert!(carrying.is_none());
    trips
}

#[tokio::test]
async fn rejects_invalid_bank() {
    let channel = Arc::new(DispatchChannel::new());
    let sink: Arc<dyn EventSink> = Arc::new(crate::NullSink);
    let result = CarPool::spawn(bank(0, 10), channel, sink, CancellationToken::new());
    assert!(matches!(result, Err(Error::InvalidConfig { .. })));
}

#[tokio::test(start_paused = true)]
async fn single_car_serves_lobby_to_top() {
    let mut h = launch(bank(1, 10), &[call(1, 10)]);

    let events = collect_until_dropoffs(&mut h.events, 1).await;
    let mut expected = vec![CarEvent::PickedUp { car: 1, floor: 1 }];
    expected.extend((2..=10).map(|floor| CarEvent::Arrived { car: 1, floor }));
    expected.push(CarEvent::DroppedOff { car: 1, floor: 10 });
    assert_eq!(events, expected);

    let report = h.pool.shutdown().await;
    assert!(report.is_clean());
    assert!(report.undelivered.is_empty());
}

#[tokio::test(start_paused = true)]
async fn every_call_is_serviced_exactly_once() {
    let calls = [
        call(1, 5),
        call(3, 9),
        call(10, 2),
        call(6, 1),
        call(2, 8),
        call(7, 4),
        call(9, 10),
        call(4, 3),
        call(5, 7),
        call(8, 6),
        call(1, 10),
        call(10, 1),
    ];
    let mut h = launch(bank(3, 10), &calls);

    let events = collect_until_dropoffs(&mut h.events, calls.len()).await;

    let mut serviced: Vec<_> = (1..=3).flat_map(|car| replay_car(&events, car)).collect();
    let mut pushed: Vec<_> = calls
        .iter()
        .map(|c| (c.origin(), c.destination()))
        .collect();
    serviced.sort_unstable();
    pushed.sort_unstable();
    assert_eq!(serviced, pushed);

    assert!(h.channel.is_empty());
    let snapshots = h.pool.snapshot();
    assert_eq!(snapshots.iter().map(|s| s.serviced).sum::<u64>(), 12);
    assert!(snapshots.iter().all(|s| s.pending == 0));
    assert!(snapshots.iter().all(|s| (1..=10).contains(&s.floor)));

    assert!(h.pool.shutdown().await.is_clean());
}

#[tokio::test(start_paused = true)]
async fn idle_cars_share_simultaneous_calls() {
    let mut h = launch(bank(2, 10), &[call(1, 4), call(1, 6)]);

    let events = collect_until_dropoffs(&mut h.events, 2).await;
    assert_eq!(replay_car(&events, 1).len(), 1);
    assert_eq!(replay_car(&events, 2).len(), 1);

    h.pool.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn idle_workers_stop_without_waiting_for_poll_timeout() {
    let h = launch(bank(2, 10), &[]);
    sleep(Duration::from_millis(120)).await;

    let start = Instant::now();
    let report = h.pool.shutdown().await;
    assert!(start.elapsed() < h.pool.config().poll_timeout);
    assert!(report.is_clean());
}

#[tokio::test(start_paused = true)]
async fn shutdown_mid_transit_halts_cars_and_reports_leftovers() {
    let mut h = launch(bank(1, 10), &[call(1, 10)]);
    // The only car is busy, so these stay in the channel.
    h.channel.push(call(2, 3)).unwrap();
    h.channel.push(call(4, 5)).unwrap();

    sleep(TICK * 3 + TICK / 2).await;
    let start = Instant::now();
    let report = h.pool.shutdown().await;
    assert!(start.elapsed() < TICK);

    assert!(report.is_clean());
    assert_eq!(report.undelivered, vec![call(2, 3), call(4, 5)]);
    assert_eq!(h.pool.cars()[0].current_floor(), 4);

    sleep(TICK * 20).await;
    let mut arrivals = Vec::new();
    while let Ok(event) = h.events.try_recv() {
        if let CarEvent::Arrived { floor, .. } = event {
            arrivals.push(floor);
        }
    }
    assert_eq!(arrivals, [2, 3, 4]);
    assert_eq!(h.pool.cars()[0].current_floor(), 4);
}

#[tokio::test(start_paused = true)]
async fn channel_is_unusable_after_shutdown() {
    let h = launch(bank(1, 10), &[]);
    h.pool.shutdown().await;

    assert_eq!(h.channel.push(call(1, 2)), Err(Error::ChannelClosed));
    assert!(h.pool.shutdown_token().is_cancelled());

    let again = h.pool.shutdown().await;
    assert_eq!(again, ShutdownReport::default());
}

#[tokio::test(start_paused = true)]
async fn worker_fails_loudly_when_channel_disappears() {
    let channel = Arc::new(DispatchChannel::new());
    let car = Arc::new(crate::Car::new(1, &bank(1, 10), Arc::new(crate::NullSink)));
    let worker = tokio::spawn(car_loop(
        car,
        Arc::clone(&channel),
        Duration::from_millis(500),
        CancellationToken::new(),
    ));

    sleep(Duration::from_millis(750)).await;
    channel.close();
    assert_eq!(worker.await.unwrap(), Err(Error::ChannelClosed));
}
