use std::sync::Once;
use std::time::Duration;

use crawler_core::{update, Effect, Msg, Phase, SchedulerSettings, SchedulerState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawler_logging::initialize_for_tests);
}

fn claims(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::ClaimNext))
        .count()
}

#[test]
fn tick_before_visited_load_never_claims() {
    init_logging();
    let state = SchedulerState::new(SchedulerSettings::default());

    let (state, effects) = update(state, Msg::Tick);
    assert_eq!(claims(&effects), 0);
    assert!(effects.contains(&Effect::ScheduleTick {
        after: Duration::from_millis(100)
    }));
    assert_eq!(state.slots_in_use(), 0);

    let (state, effects) = update(state, Msg::Tick);
    assert_eq!(claims(&effects), 0);
    assert!(!state.view().visited_loaded);
}

#[test]
fn visited_loaded_opens_the_barrier() {
    init_logging();
    let state = SchedulerState::new(SchedulerSettings::default());

    let (state, effects) = update(state, Msg::VisitedLoaded { count: 12 });
    assert_eq!(
        effects,
        vec![Effect::ScheduleTick {
            after: Duration::ZERO
        }]
    );
    assert!(state.view().visited_loaded);

    let (state, effects) = update(state, Msg::Tick);
    assert_eq!(effects, vec![Effect::ClaimNext]);
    assert_eq!(state.phase(), Phase::Claiming);
}

#[test]
fn duplicate_load_does_not_start_a_second_tick_chain() {
    init_logging();
    let state = SchedulerState::new(SchedulerSettings::default());
    let (state, _) = update(state, Msg::VisitedLoaded { count: 0 });
    let (_state, effects) = update(state, Msg::VisitedLoaded { count: 0 });
    assert!(effects.is_empty());
}

#[test]
fn shutdown_before_load_finishes_immediately() {
    init_logging();
    let state = SchedulerState::new(SchedulerSettings::default());
    let (state, effects) = update(state, Msg::Shutdown);
    assert!(effects.is_empty());
    assert!(state.is_finished());

    let (state, effects) = update(state, Msg::VisitedLoaded { count: 3 });
    assert!(effects.is_empty());
    assert!(state.is_finished());
}
