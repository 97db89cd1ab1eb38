//! Shared test fixtures.

#![allow(dead_code)]

use reflow::{mutations, MutationStream, Reactor};

/// Minimal counter container: two actions, two mutations, one integer of
/// state.
#[derive(Debug, Default)]
pub struct Counter;

#[derive(Debug)]
pub enum CounterAction {
    Increase,
    Decrease,
}

#[derive(Debug)]
pub enum CounterMutation {
    IncreaseValue,
    DecreaseValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CounterState {
    pub value: i64,
}

impl Reactor for Counter {
    type Action = CounterAction;
    type Mutation = CounterMutation;
    type State = CounterState;

    fn initial_state(&self) -> CounterState {
        CounterState::default()
    }

    fn mutate(&self, action: CounterAction) -> MutationStream<CounterMutation> {
        match action {
            CounterAction::Increase => mutations::just(CounterMutation::IncreaseValue),
            CounterAction::Decrease => mutations::just(CounterMutation::DecreaseValue),
        }
    }

    fn reduce(&self, state: CounterState, mutation: CounterMutation) -> CounterState {
        let mut next = state;
        match mutation {
            CounterMutation::IncreaseValue => next.value += 1,
            CounterMutation::DecreaseValue => next.value -= 1,
        }
        next
    }
}
