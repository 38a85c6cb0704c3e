//! Timers and animation frames
//!
//! Scheduling traits plus [`ManualScheduler`], a deterministic clock that
//! only moves when told to.

use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

/// One-shot timer callback
pub type TimerCallback = Box<dyn FnOnce()>;

/// Frame callback
pub type FrameCallback = Box<dyn FnOnce()>;

/// Timer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Frame handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Instant;
}

/// One-shot timers (setTimeout / clearTimeout)
pub trait TimerScheduler: Clock {
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a timer; cancelling a fired or unknown handle is a no-op
    fn cancel_timer(&self, handle: TimerHandle);
}

/// Pre-render callbacks (requestAnimationFrame / cancelAnimationFrame)
pub trait FrameScheduler {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel_frame(&self, handle: FrameHandle);
}

struct PendingTimer {
    handle: TimerHandle,
    deadline: Duration,
    callback: TimerCallback,
}

/// Deterministic scheduler driven by [`advance`](Self::advance) and
/// [`run_frame`](Self::run_frame)
pub struct ManualScheduler {
    origin: Instant,
    elapsed: Cell<Duration>,
    next_handle: Cell<u64>,
    timers: RefCell<Vec<PendingTimer>>,
    frames: RefCell<Vec<(FrameHandle, FrameCallback)>>,
}

impl Default for ManualScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Cell::new(Duration::ZERO),
            next_handle: Cell::new(1),
            timers: RefCell::new(Vec::new()),
            frames: RefCell::new(Vec::new()),
        }
    }

    /// Time since the scheduler was created
    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }

    /// Move the clock forward, firing due timers in deadline order.
    ///
    /// Each timer runs with the clock set to its own deadline. Timers armed
    /// by callbacks fire within the same call if they fall due before the
    /// target time. Returns the number of timers fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.elapsed.get() + by;
        let mut fired = 0;

        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= target)
                    .min_by_key(|(_, t)| (t.deadline, t.handle))
                    .map(|(idx, _)| idx);
                due.map(|idx| timers.remove(idx))
            };

            let Some(timer) = next else { break };
            if timer.deadline > self.elapsed.get() {
                self.elapsed.set(timer.deadline);
            }
            tracing::trace!(handle = timer.handle.0, "timer fired");
            (timer.callback)();
            fired += 1;
        }

        self.elapsed.set(target);
        fired
    }

    /// Shorthand for `advance(Duration::from_millis(ms))`
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.advance(Duration::from_millis(ms))
    }

    /// Run the frame callbacks pending at call time.
    ///
    /// Frames requested while running are deferred to the next call, and a
    /// frame cancelled by an earlier callback in the same batch is skipped.
    pub fn run_frame(&self) -> usize {
        let batch: Vec<FrameHandle> = self.frames.borrow().iter().map(|(h, _)| *h).collect();
        let mut ran = 0;

        for handle in batch {
            let callback = {
                let mut frames = self.frames.borrow_mut();
                frames
                    .iter()
                    .position(|(h, _)| *h == handle)
                    .map(|idx| frames.remove(idx).1)
            };
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }

        ran
    }

    /// Number of armed timers
    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Number of requested frames
    pub fn pending_frames(&self) -> usize {
        self.frames.borrow().len()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_handle.get();
        self.next_handle.set(id + 1);
        id
    }
}

impl Clock for ManualScheduler {
    fn now(&self) -> Instant {
        self.origin + self.elapsed.get()
    }
}

impl TimerScheduler for ManualScheduler {
    fn schedule_after(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id());
        self.timers.borrow_mut().push(PendingTimer {
            handle,
            deadline: self.elapsed.get() + delay,
            callback,
        });
        handle
    }

    fn cancel_timer(&self, handle: TimerHandle) {
        self.timers.borrow_mut().retain(|t| t.handle != handle);
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_frame(&self, callback: FrameCallback) -> FrameHandle {
        let handle = FrameHandle(self.next_id());
        self.frames.borrow_mut().push((handle, callback));
        handle
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        self.frames.borrow_mut().retain(|(h, _)| *h != handle);
    }
}
