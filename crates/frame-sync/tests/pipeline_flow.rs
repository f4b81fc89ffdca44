//! End-to-end behaviour of the three-stage pipeline: latest-wins frame
//! dropping under a slow middle stage, clean mid-run shutdown, and bounded
//! shutdown latency while stages are parked mid-wait.

use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use frame_sync::{Pipeline, PipelineSlot, StopFlag, spawn_sink, spawn_source, spawn_transform};

#[test]
fn slow_consumer_sees_increasing_tags_with_gaps() {
    let observed = Arc::new(Mutex::new(Vec::new()));

    let mut tag = 0u32;
    let source = move || {
        if tag >= 1000 {
            return None; // end of stream
        }
        tag += 1;
        Some(Arc::new(tag))
    };

    // Artificially slow middle stage: most tags must be dropped.
    let transform = |frame: &Arc<u32>| {
        thread::sleep(Duration::from_millis(5));
        Some(frame.clone())
    };

    let sink = {
        let observed = observed.clone();
        move |frame: &Arc<u32>| {
            observed.lock().unwrap().push(**frame);
        }
    };

    let pipeline = Pipeline::launch(source, transform, sink).expect("launch");
    let stop = pipeline.stop_flag();
    let started = Instant::now();
    pipeline
        .run(|| started.elapsed() > Duration::from_millis(300))
        .expect("clean shutdown");
    assert!(stop.is_set());

    let observed = observed.lock().unwrap();
    assert!(!observed.is_empty(), "display stage never ran");
    assert!(
        observed.windows(2).all(|w| w[0] < w[1]),
        "tags not strictly increasing: {observed:?}"
    );
    assert!(
        observed.len() < 1000,
        "a 5ms/frame stage cannot have kept up with every tag"
    );
}

#[test]
fn shutdown_is_bounded_while_stages_are_parked() {
    // Source trickles items; transform forwards nothing, so the sink stays
    // parked on an empty slot the whole time.
    let source = || {
        thread::sleep(Duration::from_millis(10));
        Some(Arc::new(0u32))
    };
    let transform = |_: &Arc<u32>| None::<Arc<u32>>;
    let sink = |_: &Arc<u32>| {};

    let pipeline = Pipeline::launch(source, transform, sink).expect("launch");
    thread::sleep(Duration::from_millis(50));

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let result = pipeline.shutdown();
        let _ = done_tx.send(result);
    });

    done_rx
        .recv_timeout(Duration::from_secs(1))
        .expect("shutdown did not complete in time")
        .expect("stages joined cleanly");
}

#[test]
fn slots_are_quiescent_after_manual_stage_shutdown() {
    let stop = StopFlag::new();
    let captured: Arc<PipelineSlot<Arc<u32>>> = Arc::new(PipelineSlot::new(stop.clone()));
    let transformed: Arc<PipelineSlot<Arc<u32>>> = Arc::new(PipelineSlot::new(stop.clone()));

    let mut tag = 0u32;
    let capture = spawn_source("capture", stop.clone(), captured.clone(), move || {
        tag = tag.wrapping_add(1);
        Some(Arc::new(tag))
    })
    .expect("spawn capture");
    let process = spawn_transform(
        "process",
        stop.clone(),
        captured.clone(),
        transformed.clone(),
        |frame: &Arc<u32>| Some(frame.clone()),
    )
    .expect("spawn process");
    let display = spawn_sink(
        "display",
        stop.clone(),
        transformed.clone(),
        |_: &Arc<u32>| {},
    )
    .expect("spawn display");

    thread::sleep(Duration::from_millis(100));
    stop.trip();
    capture.join().expect("capture exits");
    process.join().expect("process exits");
    display.join().expect("display exits");

    // Each slot ends holding at most one pending item, and nothing
    // repopulates it after the threads are gone.
    let _ = captured.take();
    assert!(captured.take().is_none());
    let _ = transformed.take();
    assert!(transformed.take().is_none());
}

#[test]
fn fast_stages_make_monotonic_progress_under_stress() {
    let observed = Arc::new(Mutex::new(Vec::new()));

    let mut tag = 0u64;
    let source = move || {
        tag += 1;
        Some(Arc::new(tag))
    };
    let transform = |frame: &Arc<u64>| Some(frame.clone());
    let sink = {
        let observed = observed.clone();
        move |frame: &Arc<u64>| observed.lock().unwrap().push(**frame)
    };

    let pipeline = Pipeline::launch(source, transform, sink).expect("launch");
    let started = Instant::now();
    pipeline
        .run(|| started.elapsed() > Duration::from_millis(200))
        .expect("clean shutdown");

    let observed = observed.lock().unwrap();
    assert!(
        observed.len() > 10,
        "pipeline stalled: only {} frames reached the sink",
        observed.len()
    );
    assert!(observed.windows(2).all(|w| w[0] < w[1]));
}
