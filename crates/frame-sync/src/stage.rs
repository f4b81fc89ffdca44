//! Stage loop runners.
//!
//! Every stage thread follows the same discipline: check the stop flag each
//! iteration, pull the newest input (where there is one), do the stage's
//! work outside any slot lock, and push the result downstream. Teardown of
//! a stage with a downstream neighbour always ends with a single
//! [`PipelineSlot::wake`] so the neighbour is never left parked on a slot
//! that will not change again. Keeping that nudge inside the runner, rather
//! than at each call site, is what makes shutdown latency bounded by
//! construction.

use std::{io, sync::Arc, thread};

use crate::{
    slot::{Identity, PipelineSlot},
    stop::StopFlag,
};

fn spawn_named<F>(name: &str, body: F) -> io::Result<thread::JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new().name(name.into()).spawn(body)
}

/// Spawn the head-of-pipeline stage.
///
/// `next` is polled every iteration; each yielded item is published to
/// `out`, unconditionally replacing its predecessor, so this stage is never
/// blocked by downstream speed. A `None` from `next` is end of stream and
/// trips the shared stop flag so the rest of the pipeline winds down too.
pub fn spawn_source<T, F>(
    name: &str,
    stop: StopFlag,
    out: Arc<PipelineSlot<T>>,
    mut next: F,
) -> io::Result<thread::JoinHandle<()>>
where
    T: Send + 'static,
    F: FnMut() -> Option<T> + Send + 'static,
{
    spawn_named(name, move || {
        while !stop.is_set() {
            match next() {
                Some(item) => out.produce(item),
                None => {
                    stop.trip();
                    break;
                }
            }
        }
        out.wake();
    })
}

/// Spawn a middle stage: newest item in, transformed item out.
///
/// The runner keeps the stage's "last seen" reference locally; the slot has
/// no memory of what was consumed. The stop flag is re-checked between
/// acquiring an item and transforming it, so no work is started on a
/// half-shutdown pipeline. A `None` from `transform` skips the frame
/// without publishing anything downstream.
pub fn spawn_transform<I, O, F>(
    name: &str,
    stop: StopFlag,
    input: Arc<PipelineSlot<I>>,
    output: Arc<PipelineSlot<O>>,
    mut transform: F,
) -> io::Result<thread::JoinHandle<()>>
where
    I: Identity + Clone + Send + 'static,
    O: Send + 'static,
    F: FnMut(&I) -> Option<O> + Send + 'static,
{
    spawn_named(name, move || {
        let mut last: Option<I> = None;
        loop {
            let Some(item) = input.wait_for_next(last.as_ref()) else {
                break;
            };
            last = Some(item.clone());
            if stop.is_set() {
                break;
            }
            if let Some(result) = transform(&item) {
                output.produce(result);
            }
        }
        output.wake();
    })
}

/// Spawn the tail-of-pipeline stage. Same shape as a transform stage but
/// with nothing downstream, so teardown has nobody to wake.
pub fn spawn_sink<I, F>(
    name: &str,
    stop: StopFlag,
    input: Arc<PipelineSlot<I>>,
    mut sink: F,
) -> io::Result<thread::JoinHandle<()>>
where
    I: Identity + Clone + Send + 'static,
    F: FnMut(&I) + Send + 'static,
{
    spawn_named(name, move || {
        let mut last: Option<I> = None;
        loop {
            let Some(item) = input.wait_for_next(last.as_ref()) else {
                break;
            };
            last = Some(item.clone());
            if stop.is_set() {
                break;
            }
            sink(&item);
        }
    })
}
