//! Timing utilities for request measurements.
//!
//! All measurements use the monotonic clock. Absolute points are expressed
//! as milliseconds since the process clock was first read, which gives the
//! same shape as a browser's `performance.now()`.

use crate::proxy::types::TimingInfo;
use std::sync::OnceLock;
use std::time::Instant;

static PROCESS_CLOCK: OnceLock<Instant> = OnceLock::new();

/// Returns the process-wide reference instant, initialising it on first use.
pub fn process_clock() -> Instant {
    *PROCESS_CLOCK.get_or_init(Instant::now)
}

/// Milliseconds elapsed between the process clock and `at`.
pub fn millis_since_start(at: Instant) -> f64 {
    at.saturating_duration_since(process_clock()).as_secs_f64() * 1000.0
}

/// A measured stage of the first hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Dns,
    Tcp,
    Tls,
    /// From writing the request to the response head.
    Ttfb,
    Download,
}

impl Phase {
    const ALL: usize = 5;

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Span {
    began: Option<Instant>,
    ended: Option<Instant>,
}

impl Span {
    fn millis(&self) -> Option<u64> {
        match (self.began, self.ended) {
            (Some(b), Some(e)) => Some(e.saturating_duration_since(b).as_millis() as u64),
            _ => None,
        }
    }
}

/// Stopwatch for one proxied exchange.
///
/// Phases are only recorded for the first hop of a redirect chain; the
/// overall start/finish pair spans every hop.
#[derive(Debug)]
pub struct DetailedTiming {
    spans: [Span; Phase::ALL],
    started: Instant,
    finished: Option<Instant>,
}

impl DetailedTiming {
    pub fn new() -> Self {
        // The reference clock must predate the measurement.
        process_clock();
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(started: Instant) -> Self {
        Self {
            spans: [Span::default(); Phase::ALL],
            started,
            finished: None,
        }
    }

    pub fn begin(&mut self, phase: Phase) {
        self.spans[phase.slot()].began = Some(Instant::now());
    }

    pub fn end(&mut self, phase: Phase) {
        self.spans[phase.slot()].ended = Some(Instant::now());
    }

    /// Milliseconds spent in `phase`, if it both began and ended.
    pub fn phase_millis(&self, phase: Phase) -> Option<u64> {
        self.spans[phase.slot()].millis()
    }

    pub fn finish(&mut self) {
        self.finished = Some(Instant::now());
    }

    /// An unfinished measurement is closed at the current instant.
    pub fn to_timing_info(&self) -> TimingInfo {
        let end = self.finished.unwrap_or_else(Instant::now);

        TimingInfo {
            start: millis_since_start(self.started),
            end: millis_since_start(end),
            duration: end.saturating_duration_since(self.started).as_secs_f64() * 1000.0,
            dns: self.phase_millis(Phase::Dns),
            tcp: self.phase_millis(Phase::Tcp),
            tls: self.phase_millis(Phase::Tls),
            ttfb: self.phase_millis(Phase::Ttfb),
            download: self.phase_millis(Phase::Download),
        }
    }
}

impl Default for DetailedTiming {
    fn default() -> Self {
        Self::new()
    }
}
