use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn counting_orientation_callback(count: &Arc<AtomicUsize>) -> OrientationCallback {
    let count = Arc::clone(count);
    Arc::new(move |_event: &OrientationChangeEvent| {
        count.fetch_add(1, Ordering::SeqCst);
    })
}

#[test]
fn subscription_releases_once() {
    let releases = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&releases);
    let mut subscription = Subscription::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert!(subscription.is_active());
    subscription.remove();
    subscription.remove();
    drop(subscription);

    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_a_subscription_releases_it() {
    let source = SimulatedOrientationSource::new(Orientation::Portrait);
    let count = Arc::new(AtomicUsize::new(0));
    let subscription = source.on_orientation_change(counting_orientation_callback(&count));
    assert_eq!(source.listener_count(), 1);

    drop(subscription);
    source.rotate_to(Orientation::Landscape);

    assert_eq!(source.listener_count(), 0);
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[test]
fn orientation_changes_reach_subscribers() {
    let source = SimulatedOrientationSource::new(Orientation::Portrait);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = source.on_orientation_change(Arc::new(move |event: &OrientationChangeEvent| {
        sink.lock().push(event.orientation());
    }));

    source.rotate_to(Orientation::Landscape);
    source.rotate_to(Orientation::Portrait);

    assert_eq!(
        *seen.lock(),
        vec![Orientation::Landscape, Orientation::Portrait]
    );
}

#[tokio::test]
async fn probe_reports_orientation_at_issue_time() {
    let source = SimulatedOrientationSource::new(Orientation::Portrait);
    source.hold_probes();

    let probe = {
        let source = Arc::clone(&source);
        tokio::spawn(async move { source.current_orientation().await })
    };
    for _ in 0..3 {
        tokio::task::yield_now().await;
    }

    source.rotate_to(Orientation::Landscape);
    source.release_probes();

    let reported = tokio::time::timeout(Duration::from_secs(1), probe)
        .await
        .expect("probe resolves")
        .expect("probe task")
        .expect("probe result");
    assert_eq!(reported, Orientation::Portrait);
}

#[tokio::test]
async fn failing_probe_returns_error() {
    let source = SimulatedOrientationSource::new(Orientation::Portrait);
    source.fail_probes("sensor unavailable");

    let err = source.current_orientation().await.expect_err("should fail");
    assert!(err.to_string().contains("sensor unavailable"));
}

#[test]
fn viewport_removal_is_by_callback_identity() {
    let viewport = SimulatedViewport::new(400.0, 800.0);
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let callback: DimensionsCallback = Arc::new(move |_event: &DimensionsChangeEvent| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let stranger: DimensionsCallback = Arc::new(|_event: &DimensionsChangeEvent| {});

    viewport.add_dimensions_listener(DimensionsEventKind::Change, Arc::clone(&callback));
    viewport.remove_dimensions_listener(DimensionsEventKind::Change, &stranger);
    viewport.resize(800.0, 400.0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(viewport.window_size(), WindowSize::new(800.0, 400.0));

    viewport.remove_dimensions_listener(DimensionsEventKind::Change, &callback);
    viewport.remove_dimensions_listener(DimensionsEventKind::Change, &callback);
    viewport.resize(400.0, 800.0);
    assert_eq!(count.load(Ordering::SeqCst), 1);
    assert_eq!(viewport.listener_count(), 0);
}
