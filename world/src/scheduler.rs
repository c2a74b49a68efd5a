//! Frame-driven deferred event scheduler.
//!
//! Events move through three states: pending until their start tick, active
//! while their window is open, and retired once the final invocation ran or
//! they were cancelled. Callbacks receive the host mutably, so completions can
//! change world state synchronously within the tick that finishes them.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, mem,
};

use setlerio_core::PreconditionError;
use tracing::trace;

/// Identifier of a scheduled event. Handles increase monotonically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventHandle(u64);

impl EventHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Length of an event's active window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventDuration {
    /// Runs for the provided number of ticks after the start tick.
    Ticks(u64),
    /// Runs every tick until cancelled.
    Forever,
}

/// Progress reported to a callback on each invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventProgress {
    /// Ticks since the event's start tick.
    pub elapsed: u64,
    /// Window length of the event.
    pub duration: EventDuration,
}

impl EventProgress {
    /// Reports whether this is the event's last invocation.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        match self.duration {
            EventDuration::Ticks(duration) => self.elapsed >= duration,
            EventDuration::Forever => false,
        }
    }

    /// Fraction of the window that has elapsed, `1.0` for zero-length windows.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        match self.duration {
            EventDuration::Ticks(0) => 1.0,
            EventDuration::Ticks(duration) => {
                (self.elapsed as f64 / duration as f64).min(1.0)
            }
            EventDuration::Forever => 0.0,
        }
    }
}

/// Callback invoked once per tick while an event is active.
pub type EventCallback<C> = Box<dyn FnMut(&mut C, EventProgress)>;

struct ScheduledEvent<C> {
    start: u64,
    duration: EventDuration,
    callback: EventCallback<C>,
}

/// Ordered collection of timed callbacks operating on a host of type `C`.
pub struct Scheduler<C> {
    next_handle: u64,
    events: BTreeMap<EventHandle, ScheduledEvent<C>>,
    running: bool,
    in_flight: BTreeSet<EventHandle>,
    cancelled: BTreeSet<EventHandle>,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            next_handle: 0,
            events: BTreeMap::new(),
            running: false,
            in_flight: BTreeSet::new(),
            cancelled: BTreeSet::new(),
        }
    }
}

impl<C> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("next_handle", &self.next_handle)
            .field("scheduled", &self.len())
            .field("running", &self.running)
            .finish()
    }
}

impl<C> Scheduler<C> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a callback starting `start_offset` ticks after the next tick.
    ///
    /// The start tick is always strictly after `now`.
    pub fn push(
        &mut self,
        now: u64,
        start_offset: u64,
        duration: EventDuration,
        callback: EventCallback<C>,
    ) -> EventHandle {
        let start = now.saturating_add(1).saturating_add(start_offset);
        self.insert(start, duration, callback)
    }

    /// Schedules a callback at an absolute start tick.
    pub fn push_at(
        &mut self,
        now: u64,
        start: u64,
        duration: EventDuration,
        callback: EventCallback<C>,
    ) -> Result<EventHandle, PreconditionError> {
        if start <= now {
            return Err(PreconditionError::ScheduledInPast { start, now });
        }
        Ok(self.insert(start, duration, callback))
    }

    fn insert(
        &mut self,
        start: u64,
        duration: EventDuration,
        callback: EventCallback<C>,
    ) -> EventHandle {
        let handle = EventHandle(self.next_handle);
        self.next_handle += 1;
        let _ = self.events.insert(
            handle,
            ScheduledEvent {
                start,
                duration,
                callback,
            },
        );
        trace!(handle = handle.0, start, ?duration, "event scheduled");
        handle
    }

    /// Cancels an event. Unknown or retired handles are ignored.
    ///
    /// Returns whether a live event was cancelled. Cancelling from inside a
    /// callback prevents any later invocation, including one later in the
    /// same pass.
    pub fn cancel(&mut self, handle: EventHandle) -> bool {
        if self.events.remove(&handle).is_some() {
            trace!(handle = handle.0, "event cancelled");
            return true;
        }
        if self.in_flight.contains(&handle) {
            trace!(handle = handle.0, "in-flight event cancelled");
            return self.cancelled.insert(handle);
        }
        false
    }

    /// Reports whether the handle refers to a live event.
    #[must_use]
    pub fn is_scheduled(&self, handle: EventHandle) -> bool {
        self.events.contains_key(&handle)
            || (self.in_flight.contains(&handle) && !self.cancelled.contains(&handle))
    }

    /// Number of live events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len() + self.in_flight.len().saturating_sub(self.cancelled.len())
    }

    /// Reports whether no events are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Types that own the scheduler whose callbacks operate on them.
pub trait SchedulerHost: Sized {
    /// Mutable access to the host's scheduler.
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self>;
}

/// Invokes every event whose window is open at `now`, in handle order.
///
/// Events scheduled while the pass runs wait for the next pass. Calling this
/// from inside a callback is a precondition violation: debug builds panic and
/// release builds ignore the nested call.
pub fn run_due_events<H: SchedulerHost>(host: &mut H, now: u64) {
    let scheduler = host.scheduler_mut();
    if scheduler.running {
        debug_assert!(false, "run_due_events called re-entrantly");
        return;
    }
    scheduler.running = true;

    let mut batch = mem::take(&mut scheduler.events);
    scheduler.in_flight = batch.keys().copied().collect();

    let mut retired = Vec::new();
    for (handle, event) in batch.iter_mut() {
        if host.scheduler_mut().cancelled.contains(handle) || now < event.start {
            continue;
        }

        let progress = EventProgress {
            elapsed: now - event.start,
            duration: event.duration,
        };
        let overdue = matches!(event.duration, EventDuration::Ticks(duration) if progress.elapsed > duration);
        if !overdue {
            (event.callback)(host, progress);
        }

        if overdue || progress.is_final() {
            retired.push(*handle);
            let scheduler = host.scheduler_mut();
            let _ = scheduler.in_flight.remove(handle);
            let _ = scheduler.cancelled.remove(handle);
        }
    }

    for handle in retired {
        let _ = batch.remove(&handle);
    }
    let scheduler = host.scheduler_mut();
    for handle in mem::take(&mut scheduler.cancelled) {
        let _ = batch.remove(&handle);
    }
    scheduler.in_flight.clear();
    scheduler.events.append(&mut batch);
    scheduler.running = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        scheduler: Scheduler<Recorder>,
        calls: Vec<(&'static str, u64)>,
        handles: Vec<EventHandle>,
    }

    impl SchedulerHost for Recorder {
        fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
            &mut self.scheduler
        }
    }

    fn record(label: &'static str) -> EventCallback<Recorder> {
        Box::new(move |host: &mut Recorder, progress| host.calls.push((label, progress.elapsed)))
    }

    fn run_ticks(host: &mut Recorder, ticks: std::ops::RangeInclusive<u64>) {
        for tick in ticks {
            run_due_events(host, tick);
        }
    }

    #[test]
    fn event_runs_for_every_elapsed_value_then_retires() {
        let mut host = Recorder::default();
        let _ = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(3), record("a"));

        run_ticks(&mut host, 1..=6);

        assert_eq!(host.calls, vec![("a", 0), ("a", 1), ("a", 2), ("a", 3)]);
        assert!(host.scheduler.is_empty());
    }

    #[test]
    fn start_offset_delays_first_invocation() {
        let mut host = Recorder::default();
        let _ = host
            .scheduler
            .push(10, 2, EventDuration::Ticks(0), record("late"));

        run_ticks(&mut host, 11..=12);
        assert!(host.calls.is_empty());
        run_due_events(&mut host, 13);
        assert_eq!(host.calls, vec![("late", 0)]);
    }

    #[test]
    fn push_at_rejects_current_and_past_ticks() {
        let mut scheduler = Scheduler::<Recorder>::new();
        let error = scheduler
            .push_at(5, 5, EventDuration::Ticks(1), record("now"))
            .expect_err("current tick");
        assert_eq!(error, PreconditionError::ScheduledInPast { start: 5, now: 5 });
        assert!(scheduler
            .push_at(5, 6, EventDuration::Ticks(1), record("next"))
            .is_ok());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut host = Recorder::default();
        let handle = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(3), record("a"));

        run_due_events(&mut host, 1);
        assert!(host.scheduler.cancel(handle));
        assert!(!host.scheduler.cancel(handle));
        assert!(!host.scheduler.is_scheduled(handle));
        run_ticks(&mut host, 2..=4);

        assert_eq!(host.calls, vec![("a", 0)]);
    }

    #[test]
    fn cancelling_a_retired_event_is_a_no_op() {
        let mut host = Recorder::default();
        let handle = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(1), record("a"));

        run_ticks(&mut host, 1..=3);

        assert_eq!(host.calls, vec![("a", 0), ("a", 1)]);
        assert!(!host.scheduler.cancel(handle));
        assert!(!host.scheduler.is_scheduled(handle));
        assert!(host.scheduler.is_empty());
    }

    fn cancel_self(label: &'static str, slot: usize) -> EventCallback<Recorder> {
        Box::new(move |host: &mut Recorder, progress| {
            host.calls.push((label, progress.elapsed));
            let own = host.handles[slot];
            assert!(host.scheduler.cancel(own), "{label} should still be live");
        })
    }

    #[test]
    fn events_cancelling_themselves_never_run_again() {
        let mut host = Recorder::default();
        let looping = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(3), cancel_self("looping", 0));
        let last = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(0), cancel_self("last", 1));
        host.handles.extend([looping, last]);

        run_ticks(&mut host, 1..=4);

        assert_eq!(host.calls, vec![("looping", 0), ("last", 0)]);
        assert!(host.scheduler.is_empty());
        assert_eq!(host.scheduler.len(), 0);
        assert!(!host.scheduler.cancel(looping));
        assert!(!host.scheduler.cancel(last));
    }

    #[test]
    fn events_run_in_handle_order() {
        let mut host = Recorder::default();
        let _ = host
            .scheduler
            .push(0, 1, EventDuration::Ticks(0), record("first"));
        let _ = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(1), record("second"));

        run_ticks(&mut host, 1..=2);

        assert_eq!(
            host.calls,
            vec![("second", 0), ("first", 0), ("second", 1)]
        );
    }

    #[test]
    fn events_pushed_during_a_pass_wait_for_the_next_pass() {
        let mut host = Recorder::default();
        let _ = host.scheduler.push(
            0,
            0,
            EventDuration::Ticks(0),
            Box::new(|host: &mut Recorder, _| {
                host.calls.push(("outer", 0));
                let _ = host
                    .scheduler
                    .push(1, 0, EventDuration::Ticks(0), record("inner"));
            }),
        );

        run_due_events(&mut host, 1);
        assert_eq!(host.calls, vec![("outer", 0)]);
        run_due_events(&mut host, 2);
        assert_eq!(host.calls, vec![("outer", 0), ("inner", 0)]);
    }

    #[test]
    fn cancelling_a_later_event_from_a_callback_skips_it() {
        let mut host = Recorder::default();
        let _ = host.scheduler.push(
            0,
            0,
            EventDuration::Ticks(0),
            Box::new(|host: &mut Recorder, _| {
                host.calls.push(("canceller", 0));
                let victim = host.handles[0];
                let _ = host.scheduler.cancel(victim);
            }),
        );
        let victim = host
            .scheduler
            .push(0, 0, EventDuration::Ticks(2), record("victim"));
        host.handles.push(victim);

        run_ticks(&mut host, 1..=3);

        assert_eq!(host.calls, vec![("canceller", 0)]);
        assert!(host.scheduler.is_empty());
    }

    #[test]
    fn forever_events_run_until_cancelled() {
        let mut host = Recorder::default();
        let handle = host
            .scheduler
            .push(0, 0, EventDuration::Forever, record("loop"));

        run_ticks(&mut host, 1..=4);
        assert_eq!(host.calls.len(), 4);
        assert!(host.scheduler.cancel(handle));
        run_due_events(&mut host, 5);
        assert_eq!(host.calls.len(), 4);
    }

    #[test]
    fn progress_fraction_handles_zero_length_windows() {
        let instant = EventProgress {
            elapsed: 0,
            duration: EventDuration::Ticks(0),
        };
        assert!(instant.is_final());
        assert_eq!(instant.fraction(), 1.0);

        let halfway = EventProgress {
            elapsed: 2,
            duration: EventDuration::Ticks(4),
        };
        assert!(!halfway.is_final());
        assert_eq!(halfway.fraction(), 0.5);
    }
}
