use std::time::Duration;

use crate::{Effect, ErrorContext, Msg, SchedulerState, WorkerEvent};

/// Pure update function: applies a message to the scheduler of one worker and
/// returns the effects its runner must carry out.
pub fn update(mut state: SchedulerState, msg: Msg) -> (SchedulerState, Vec<Effect>) {
    let poll = state.settings().poll_interval;
    let effects = match msg {
        Msg::VisitedLoaded { .. } => {
            if state.visited_loaded() {
                return (state, Vec::new());
            }
            state.mark_visited_loaded();
            if state.is_stopping() {
                Vec::new()
            } else {
                vec![Effect::ScheduleTick {
                    after: Duration::ZERO,
                }]
            }
        }
        Msg::Tick => {
            if state.is_stopping() || state.step_in_progress() {
                // Stale timer or overlapping invocation.
                Vec::new()
            } else if !state.visited_loaded() {
                vec![
                    Effect::Emit(WorkerEvent::warning("Visited URLs not loaded yet.")),
                    Effect::ScheduleTick { after: poll },
                ]
            } else if state.try_begin_claim() {
                vec![Effect::ClaimNext]
            } else {
                vec![Effect::ScheduleTick { after: poll }]
            }
        }
        Msg::QueueEmpty => {
            if !state.is_claiming() {
                return (state, Vec::new());
            }
            state.abandon_claim();
            if state.is_stopping() {
                Vec::new()
            } else {
                vec![
                    Effect::Emit(WorkerEvent::warning("No URLs in queue.")),
                    Effect::ScheduleTick { after: poll },
                ]
            }
        }
        Msg::ClaimFailed { reason } => {
            if !state.is_claiming() {
                return (state, Vec::new());
            }
            state.abandon_claim();
            let mut effects = vec![Effect::Emit(WorkerEvent::error(
                ErrorContext::Claim,
                reason,
            ))];
            if !state.is_stopping() {
                effects.push(Effect::ScheduleTick { after: poll });
            }
            effects
        }
        Msg::Claimed(task) => {
            if !state.is_claiming() {
                return (state, Vec::new());
            }
            // The task already left the frontier, so it is dispatched even
            // while stopping. Only the pacing of the next claim is skipped.
            let pace_next = !state.is_stopping();
            state.dispatch(task.id, pace_next);
            let mut effects = Vec::with_capacity(2);
            if pace_next {
                effects.push(Effect::ResolveDelay { task: task.clone() });
            }
            effects.push(Effect::Dispatch { task });
            effects
        }
        Msg::DelayResolved { task_id, delay } => {
            if !state.take_delay(task_id) {
                return (state, Vec::new());
            }
            let after = if delay.is_zero() {
                state.settings().default_delay
            } else {
                delay
            };
            vec![Effect::ScheduleTick { after }]
        }
        Msg::FetchFinished { task_id, outcome } => {
            state.finish(task_id, outcome);
            Vec::new()
        }
        Msg::Shutdown => {
            state.begin_stopping();
            Vec::new()
        }
    };

    (state, effects)
}
