//! Fixed-capacity ring of job slots shared by the reader, worker, and writer
//! threads of the streaming driver.
//!
//! One mutex guards the ring's metadata; three condition variables wake the
//! reader (waiting for a slot to free up), the workers (waiting for a slot
//! to fill), and the writer (waiting for the next in-order slot to finish
//! processing).
//!
//! Slots pass through the public three-state cycle `Free -> Filled ->
//! Processed -> Free`. A worker additionally marks a filled slot `claimed`
//! for the brief window between picking it and finishing the encode/decode
//! call, so two workers never grab the same slot; this is bookkeeping
//! internal to the ring, not a fourth public state.

use std::sync::{Condvar, Mutex};

use crate::error::ZxcError;

/// One unit of work traveling through the ring, or the end-of-stream
/// sentinel that tells workers and the writer there is nothing more to do.
pub enum Job<T> {
    Data(T),
    Eof,
}

/// A completed job's result, or the error sentinel a worker leaves behind
/// when its chunk failed. The real `ZxcError` is recorded separately in
/// `RingInner::error` (first-error-wins); this variant only tells the
/// writer to stop draining.
pub enum JobResult<T> {
    Data(T),
    Eof,
    Err,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SlotStatus {
    Free,
    Filled,
    Processed,
}

struct Slot<I, O> {
    id: u64,
    status: SlotStatus,
    claimed: bool,
    input: Option<Job<I>>,
    output: Option<JobResult<O>>,
}

/// Padded to a cache line so adjacent slots' status/id fields don't share a
/// line under concurrent reader/worker/writer access.
#[repr(align(64))]
struct PaddedSlot<I, O>(Slot<I, O>);

impl<I, O> std::ops::Deref for PaddedSlot<I, O> {
    type Target = Slot<I, O>;
    fn deref(&self) -> &Slot<I, O> {
        &self.0
    }
}

impl<I, O> std::ops::DerefMut for PaddedSlot<I, O> {
    fn deref_mut(&mut self) -> &mut Slot<I, O> {
        &mut self.0
    }
}

struct RingInner<I, O> {
    slots: Vec<PaddedSlot<I, O>>,
    next_fill_id: u64,
    next_write_id: u64,
    shutdown: bool,
    error: Option<ZxcError>,
}

pub struct Ring<I, O> {
    inner: Mutex<RingInner<I, O>>,
    free_cv: Condvar,
    filled_cv: Condvar,
    processed_cv: Condvar,
    capacity: usize,
}

/// `R = max(4, 4*workers)`.
pub fn ring_capacity(workers: usize) -> usize {
    (4 * workers.max(1)).max(4)
}

impl<I, O> Ring<I, O> {
    pub fn new(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|_| {
                PaddedSlot(Slot {
                    id: 0,
                    status: SlotStatus::Free,
                    claimed: false,
                    input: None,
                    output: None,
                })
            })
            .collect();
        Ring {
            inner: Mutex::new(RingInner {
                slots,
                next_fill_id: 0,
                next_write_id: 0,
                shutdown: false,
                error: None,
            }),
            free_cv: Condvar::new(),
            filled_cv: Condvar::new(),
            processed_cv: Condvar::new(),
            capacity,
        }
    }

    fn index(&self, id: u64) -> usize {
        (id % self.capacity as u64) as usize
    }

    /// Reader: block until the next slot in submission order is free, then
    /// fill it and return its job id.
    pub fn fill(&self, job: Job<I>) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_fill_id;
        let idx = self.index(id);
        inner = self
            .free_cv
            .wait_while(inner, |g| g.slots[idx].status != SlotStatus::Free && !g.shutdown)
            .unwrap();
        if inner.shutdown {
            return id;
        }
        inner.slots[idx].id = id;
        inner.slots[idx].input = Some(job);
        inner.slots[idx].status = SlotStatus::Filled;
        inner.next_fill_id += 1;
        drop(inner);
        self.filled_cv.notify_all();
        id
    }

    /// Worker: block until any unclaimed filled slot exists, claim it, and
    /// return its index, id, and job. Returns `None` only when the ring is
    /// shutting down with nothing left to claim.
    pub fn claim(&self) -> Option<(usize, u64, Job<I>)> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(idx) = inner
                .slots
                .iter()
                .position(|s| s.status == SlotStatus::Filled && !s.claimed)
            {
                inner.slots[idx].claimed = true;
                let id = inner.slots[idx].id;
                let job = inner.slots[idx].input.take().expect("filled slot has input");
                return Some((idx, id, job));
            }
            if inner.shutdown {
                return None;
            }
            inner = self.filled_cv.wait(inner).unwrap();
        }
    }

    /// Worker: publish a slot's result and wake the writer.
    pub fn complete(&self, idx: usize, result: JobResult<O>) {
        let mut inner = self.inner.lock().unwrap();
        inner.slots[idx].output = Some(result);
        inner.slots[idx].status = SlotStatus::Processed;
        inner.slots[idx].claimed = false;
        drop(inner);
        self.processed_cv.notify_all();
    }

    /// Writer: block until the next slot in submission order has finished
    /// processing, then drain it and return to Free.
    pub fn drain(&self) -> JobResult<O> {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_write_id;
        let idx = self.index(id);
        inner = self
            .processed_cv
            .wait_while(inner, |g| {
                !(g.slots[idx].status == SlotStatus::Processed && g.slots[idx].id == id) && !g.shutdown
            })
            .unwrap();
        if inner.shutdown && inner.slots[idx].status != SlotStatus::Processed {
            return JobResult::Err;
        }
        let result = inner.slots[idx].output.take().expect("processed slot has output");
        inner.slots[idx].status = SlotStatus::Free;
        inner.next_write_id += 1;
        drop(inner);
        self.free_cv.notify_all();
        result
    }

    /// Record the first error seen by any thread, then wake every waiter so
    /// the whole pipeline can unwind.
    pub fn set_error(&self, err: ZxcError) {
        let mut inner = self.inner.lock().unwrap();
        if inner.error.is_none() {
            inner.error = Some(err);
        }
        inner.shutdown = true;
        drop(inner);
        self.free_cv.notify_all();
        self.filled_cv.notify_all();
        self.processed_cv.notify_all();
    }

    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.shutdown = true;
        drop(inner);
        self.free_cv.notify_all();
        self.filled_cv.notify_all();
        self.processed_cv.notify_all();
    }

    pub fn first_error(&self) -> Option<ZxcError> {
        self.inner.lock().unwrap().error
    }
}
