use std::time::Duration;

/// Timing knobs for the list reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Consecutive reconciliations without a resolved job before polling gives up.
    pub max_idle_ticks: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_idle_ticks: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilerState {
    #[default]
    Idle,
    Polling { idle_ticks: u32 },
}

/// What the caller should do after feeding the reconciler an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollDecision {
    /// Fetch the authoritative list again.
    Reload,
    /// Keep the timer running, nothing to fetch now.
    Continue,
    /// Cancel the timer; the reconciler is back to idle.
    Stop,
    /// Not polling; ignore.
    Ignore,
}

/// Two-state machine deciding when periodic reconciliation runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciler {
    policy: PollPolicy,
    state: ReconcilerState,
    reload_in_flight: bool,
}

impl Reconciler {
    pub fn new(policy: PollPolicy) -> Self {
        Self {
            policy,
            state: ReconcilerState::Idle,
            reload_in_flight: false,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn state(&self) -> ReconcilerState {
        self.state
    }

    pub fn is_polling(&self) -> bool {
        matches!(self.state, ReconcilerState::Polling { .. })
    }

    /// Enters polling. Returns true when a timer must be scheduled.
    pub fn start(&mut self) -> bool {
        match self.state {
            ReconcilerState::Idle => {
                self.state = ReconcilerState::Polling { idle_ticks: 0 };
                true
            }
            ReconcilerState::Polling { .. } => {
                self.state = ReconcilerState::Polling { idle_ticks: 0 };
                false
            }
        }
    }

    /// A timer tick fired. At most one timer-driven reload is outstanding.
    pub fn on_tick(&mut self, queue_empty: bool) -> PollDecision {
        match self.state {
            ReconcilerState::Idle => PollDecision::Ignore,
            ReconcilerState::Polling { .. } if queue_empty => self.stop(),
            ReconcilerState::Polling { .. } if self.reload_in_flight => PollDecision::Continue,
            ReconcilerState::Polling { .. } => {
                self.reload_in_flight = true;
                PollDecision::Reload
            }
        }
    }

    /// Settles the outstanding timer-driven reload. Returns false when a BOM
    /// list reply did not come from a poll tick, so it must not count as one.
    pub fn take_poll_reload(&mut self) -> bool {
        std::mem::replace(&mut self.reload_in_flight, false)
    }

    /// The BOM list was reloaded (or failed to reload, with `resolved == 0`).
    pub fn on_reconciled(&mut self, resolved: usize, queue_empty: bool) -> PollDecision {
        let ReconcilerState::Polling { idle_ticks } = self.state else {
            return PollDecision::Ignore;
        };
        if queue_empty {
            return self.stop();
        }
        let idle_ticks = if resolved > 0 { 0 } else { idle_ticks + 1 };
        if idle_ticks >= self.policy.max_idle_ticks {
            return self.stop();
        }
        self.state = ReconcilerState::Polling { idle_ticks };
        PollDecision::Continue
    }

    fn stop(&mut self) -> PollDecision {
        self.state = ReconcilerState::Idle;
        self.reload_in_flight = false;
        PollDecision::Stop
    }
}
