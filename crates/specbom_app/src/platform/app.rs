use std::collections::BTreeSet;
use std::io::Write;
use std::time::{Duration, Instant};

use bom_logging::bom_debug;
use chrono::Utc;
use specbom_core::{update, AppState, AppViewModel, Effect, Msg, QueueView};

use super::effects::{EffectRunner, Inbound};
use super::ui::render;

const TICK_INTERVAL: Duration = Duration::from_millis(250);
const RECV_SLICE: Duration = Duration::from_millis(50);

/// Drives the reducer from a script of message batches.
///
/// Each batch is dispatched once every reply owed by the previous batches has
/// arrived, so later steps observe the results of earlier ones.
pub struct Session {
    state: AppState,
    runner: EffectRunner,
    out: Box<dyn Write>,
    outstanding: usize,
    shown_notifications: BTreeSet<u64>,
    shown_queue: Option<QueueView>,
    follow_queue: bool,
}

impl Session {
    pub fn new(state: AppState, runner: EffectRunner, out: Box<dyn Write>) -> Self {
        Self {
            state,
            runner,
            out,
            outstanding: 0,
            shown_notifications: BTreeSet::new(),
            shown_queue: None,
            follow_queue: false,
        }
    }

    /// Runs `steps`, then keeps reconciling while the poll timer runs if
    /// `wait_for_jobs` is set. Returns the final view.
    pub fn run(mut self, steps: Vec<Vec<Msg>>, wait_for_jobs: bool) -> AppViewModel {
        self.follow_queue = wait_for_jobs;
        let mut steps = steps.into_iter();
        let mut last_tick = Instant::now();
        self.dispatch(Msg::Tick { now: Utc::now() });

        loop {
            if self.outstanding == 0 {
                if let Some(step) = steps.next() {
                    for msg in step {
                        self.dispatch(msg);
                    }
                    continue;
                }
                if !(wait_for_jobs && self.state.is_polling()) {
                    break;
                }
            }

            match self.runner.next_inbound(RECV_SLICE) {
                Some(Inbound::Reply(msg)) => {
                    self.outstanding = self.outstanding.saturating_sub(1);
                    self.dispatch(msg);
                }
                Some(Inbound::Timer(msg)) => self.dispatch(msg),
                None => {}
            }

            if last_tick.elapsed() >= TICK_INTERVAL {
                last_tick = Instant::now();
                self.dispatch(Msg::Tick { now: Utc::now() });
            }
        }

        if wait_for_jobs {
            // The loop can also end on a failed launch batch with the timer never stopped.
            self.runner.run(vec![Effect::StopPolling]);
        }
        self.state.view()
    }

    fn dispatch(&mut self, msg: Msg) {
        bom_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.render_changes(&state.view());
        }
        self.state = state;

        let (pending, immediate) = self.runner.run(effects);
        self.outstanding += pending;
        for reply in immediate {
            self.dispatch(reply);
        }
    }

    fn render_changes(&mut self, view: &AppViewModel) {
        for notification in &view.notifications {
            if self.shown_notifications.insert(notification.id) {
                let _ = writeln!(self.out, "{}", render::notification_line(notification));
            }
        }
        if self.follow_queue && self.shown_queue.as_ref() != Some(&view.queue) {
            let _ = write!(self.out, "{}", render::render_queue(&view.queue));
            self.shown_queue = Some(view.queue.clone());
        }
        let _ = self.out.flush();
    }
}
