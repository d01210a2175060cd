//! Reducer logic for the todo list.
//!
//! Commands are validated against current state. A valid command becomes an
//! event which is applied immediately; an invalid one becomes a
//! `CommandRejected` event recording the reason in `last_error`. Every
//! successful mutation bumps the revision and, when snapshot storage is
//! configured, returns an effect that persists the new state. That effect
//! feeds back `SnapshotSaved` or `SnapshotFailed`, which is how the store
//! learns that its file has fallen behind.

use crate::error::TodoError;
use crate::persistence::SnapshotStore;
use crate::types::{SaveFailure, TodoAction, TodoId, TodoItem, TodoState};
use std::sync::Arc;
use todo_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};

/// Environment dependencies for the todo reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for generating timestamps
    pub clock: Arc<dyn Clock>,
    /// Where snapshots go after each mutation; `None` keeps the list in memory
    pub snapshots: Option<Arc<dyn SnapshotStore>>,
}

impl TodoEnvironment {
    /// Creates an in-memory `TodoEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            snapshots: None,
        }
    }

    /// Persist every mutation to `snapshots`
    #[must_use]
    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }
}

/// Reducer for the todo list
#[derive(Clone, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a `CreateTodo` command, returning the stored title
    fn validate_create_todo(title: &str) -> Result<String, TodoError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::Validation("Todo title cannot be empty".to_string()));
        }
        Ok(title.to_string())
    }

    /// Reserves the id for a new todo
    fn allocate_id(state: &TodoState) -> Result<TodoId, TodoError> {
        state.next_id.map(TodoId::new).ok_or(TodoError::IdsExhausted)
    }

    /// Validates a command addressing an existing todo
    fn validate_exists(state: &TodoState, id: TodoId) -> Result<&TodoItem, TodoError> {
        state.get(id).ok_or(TodoError::NotFound(id))
    }

    /// Applies an event to state
    fn apply_event(state: &mut TodoState, action: &TodoAction) {
        match action {
            TodoAction::TodoCreated {
                id,
                title,
                created_at,
            } => {
                let item = TodoItem::new(*id, title.clone(), *created_at);
                state.todos.insert(*id, item);
                state.next_id = state
                    .next_id
                    .zip(id.get().checked_add(1))
                    .map(|(next, after)| next.max(after));
                state.revision += 1;
                state.last_error = None;
            },
            TodoAction::TodoToggled {
                id,
                completed,
                toggled_at,
            } => {
                if let Some(todo) = state.todos.get_mut(id) {
                    todo.set_completed(*completed, *toggled_at);
                }
                state.revision += 1;
                state.last_error = None;
            },
            TodoAction::TodoDeleted { id } => {
                state.todos.remove(id);
                state.revision += 1;
                state.last_error = None;
            },
            TodoAction::CommandRejected { error } => {
                state.last_error = Some(error.clone());
            },
            // Snapshot outcomes may arrive out of order; older ones are ignored
            TodoAction::SnapshotSaved { revision } => {
                state.saved_revision = state.saved_revision.max(*revision);
                if state
                    .save_failure
                    .as_ref()
                    .is_some_and(|failure| failure.revision <= *revision)
                {
                    state.save_failure = None;
                }
            },
            TodoAction::SnapshotFailed { revision, reason } => {
                let newest = *revision > state.saved_revision
                    && state
                        .save_failure
                        .as_ref()
                        .is_none_or(|failure| failure.revision < *revision);
                if newest {
                    state.save_failure = Some(SaveFailure {
                        revision: *revision,
                        reason: reason.clone(),
                    });
                }
            },
            // Commands are not applied to state
            TodoAction::CreateTodo { .. }
            | TodoAction::ToggleTodo { .. }
            | TodoAction::DeleteTodo { .. } => {},
        }
    }

    /// Turns a command outcome into state changes and effects
    fn settle(
        state: &mut TodoState,
        outcome: Result<TodoAction, TodoError>,
        env: &TodoEnvironment,
    ) -> SmallVec<[Effect<TodoAction>; 4]> {
        match outcome {
            Ok(event) => {
                tracing::debug!(event = event.event_type(), "Command accepted");
                Self::apply_event(state, &event);
                Self::persist(state, env)
            },
            Err(error) => {
                tracing::debug!(%error, "Command rejected");
                Self::apply_event(state, &TodoAction::CommandRejected { error });
                SmallVec::new()
            },
        }
    }

    /// Effect writing the current state to snapshot storage, if configured
    fn persist(state: &TodoState, env: &TodoEnvironment) -> SmallVec<[Effect<TodoAction>; 4]> {
        let Some(snapshots) = env.snapshots.clone() else {
            return SmallVec::new();
        };

        let snapshot = state.snapshot();
        smallvec![Effect::future(async move {
            let revision = snapshot.revision;
            match snapshots.save(snapshot).await {
                Ok(()) => Some(TodoAction::SnapshotSaved { revision }),
                Err(error) => {
                    tracing::error!(%error, revision, "Failed to persist todo list");
                    Some(TodoAction::SnapshotFailed {
                        revision,
                        reason: error.to_string(),
                    })
                },
            }
        })]
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Commands ==========
            TodoAction::CreateTodo { title } => {
                let outcome = Self::validate_create_todo(&title).and_then(|title| {
                    Ok(TodoAction::TodoCreated {
                        id: Self::allocate_id(state)?,
                        title,
                        created_at: env.clock.now(),
                    })
                });
                Self::settle(state, outcome, env)
            },

            TodoAction::ToggleTodo { id } => {
                let outcome =
                    Self::validate_exists(state, id).map(|todo| TodoAction::TodoToggled {
                        id,
                        completed: !todo.completed,
                        toggled_at: env.clock.now(),
                    });
                Self::settle(state, outcome, env)
            },

            TodoAction::DeleteTodo { id } => {
                let outcome =
                    Self::validate_exists(state, id).map(|_| TodoAction::TodoDeleted { id });
                Self::settle(state, outcome, env)
            },

            // ========== Events ==========
            TodoAction::TodoCreated { .. }
            | TodoAction::TodoToggled { .. }
            | TodoAction::TodoDeleted { .. }
            | TodoAction::CommandRejected { .. }
            | TodoAction::SnapshotSaved { .. }
            | TodoAction::SnapshotFailed { .. } => {
                // Replayed and fed-back events change state but are not persisted again
                Self::apply_event(state, &action);
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::persistence::{PersistenceError, TodoSnapshot};
    use async_trait::async_trait;
    use proptest::prelude::*;
    use todo_testing::{assertions, feedback, test_clock, ReducerTest};

    struct DiscardSnapshots;

    #[async_trait]
    impl SnapshotStore for DiscardSnapshots {
        async fn save(&self, _snapshot: TodoSnapshot) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    struct BrokenDisk;

    #[async_trait]
    impl SnapshotStore for BrokenDisk {
        async fn save(&self, _snapshot: TodoSnapshot) -> Result<(), PersistenceError> {
            Err(std::io::Error::other("disk full").into())
        }
    }

    fn create_test_env() -> TodoEnvironment {
        TodoEnvironment::new(Arc::new(test_clock()))
    }

    fn persistent_env() -> TodoEnvironment {
        create_test_env().with_snapshots(Arc::new(DiscardSnapshots))
    }

    fn create(title: &str) -> TodoAction {
        TodoAction::CreateTodo {
            title: title.to_string(),
        }
    }

    #[test]
    fn test_create_todo_success() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(create("  Buy milk  "))
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                let todo = state.get(TodoId::new(1)).unwrap();
                assert_eq!(todo.title, "Buy milk");
                assert!(!todo.completed);
                assert_eq!(todo.created_at, test_clock().now());
                assert_eq!(state.next_id, Some(2));
                assert_eq!(state.revision, 1);
                assert!(state.last_error.is_none());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_todo_empty_title() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(create(" \t ")) // Empty after trim
            .then_state(|state| {
                assert_eq!(state.count(), 0);
                assert_eq!(state.next_id, Some(1));
                assert_eq!(state.revision, 0);
                assert!(state.last_error.as_ref().unwrap().is_validation());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([
                create("a"),
                create("b"),
                TodoAction::DeleteTodo { id: TodoId::new(2) },
            ])
            .when_action(create("c"))
            .then_state(|state| {
                assert!(!state.exists(TodoId::new(2)));
                assert_eq!(state.get(TodoId::new(3)).unwrap().title, "c");
            })
            .run();
    }

    #[test]
    fn test_last_possible_id_exhausts_counter() {
        let (state, _) = ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state({
                let mut state = TodoState::new();
                state.next_id = Some(u64::MAX);
                state
            })
            .when_action(create("last one"))
            .then_state(|state| {
                assert_eq!(state.get(TodoId::new(u64::MAX)).unwrap().title, "last one");
                assert_eq!(state.next_id, None);
            })
            .run();

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .given_actions([TodoAction::DeleteTodo {
                id: TodoId::new(u64::MAX),
            }])
            .when_action(create("one too many"))
            .then_state(|state| {
                assert_eq!(state.last_error, Some(TodoError::IdsExhausted));
                assert_eq!(state.count(), 0);
                assert_eq!(state.next_id, None);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_create_never_overwrites_reloaded_item() {
        let reloaded = TodoState::from_snapshot(TodoSnapshot {
            revision: 1,
            next_id: Some(1),
            items: vec![TodoItem::new(
                TodoId::new(u64::MAX),
                "keep me".to_string(),
                test_clock().now(),
            )],
        });

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(reloaded)
            .when_action(create("new"))
            .then_state(|state| {
                assert_eq!(state.last_error, Some(TodoError::IdsExhausted));
                assert_eq!(state.count(), 1);
                assert_eq!(state.get(TodoId::new(u64::MAX)).unwrap().title, "keep me");
            })
            .run();
    }

    #[test]
    fn test_toggle_todo_twice_restores() {
        let id = TodoId::new(1);

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([create("Buy milk"), TodoAction::ToggleTodo { id }])
            .when_action(TodoAction::ToggleTodo { id })
            .then_state(move |state| {
                let todo = state.get(id).unwrap();
                assert!(!todo.completed);
                assert_eq!(todo.completed_at, None);
                assert_eq!(state.revision, 3);
            })
            .run();
    }

    #[test]
    fn test_toggle_stamps_completion_time() {
        let id = TodoId::new(1);

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([create("Buy milk")])
            .when_action(TodoAction::ToggleTodo { id })
            .then_state(move |state| {
                let todo = state.get(id).unwrap();
                assert!(todo.completed);
                assert_eq!(todo.completed_at, Some(test_clock().now()));
            })
            .run();
    }

    #[test]
    fn test_toggle_todo_not_found() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([create("Buy milk")])
            .when_action(TodoAction::ToggleTodo { id: TodoId::new(42) })
            .then_state(|state| {
                assert_eq!(
                    state.last_error,
                    Some(TodoError::NotFound(TodoId::new(42)))
                );
                assert_eq!(state.revision, 1);
                assert_eq!(state.completed_count(), 0);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_todo_success() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([create("Buy milk"), create("Walk dog")])
            .when_action(TodoAction::DeleteTodo { id: TodoId::new(1) })
            .then_state(|state| {
                assert_eq!(state.count(), 1);
                assert!(!state.exists(TodoId::new(1)));
                assert!(state.exists(TodoId::new(2)));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_delete_todo_not_found() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::DeleteTodo { id: TodoId::new(1) })
            .then_state(|state| {
                assert!(state.last_error.as_ref().unwrap().is_not_found());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_success_clears_previous_error() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([create("")])
            .when_action(create("fresh"))
            .then_state(|state| assert!(state.last_error.is_none()))
            .run();
    }

    #[test]
    fn test_rejection_does_not_persist() {
        ReducerTest::new(TodoReducer::new())
            .with_env(persistent_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::DeleteTodo { id: TodoId::new(7) })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[tokio::test]
    async fn test_mutation_persists_and_reports_saved_revision() {
        let (mut state, effects) = ReducerTest::new(TodoReducer::new())
            .with_env(persistent_env())
            .given_state(TodoState::new())
            .when_action(create("Buy milk"))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();

        let fed_back = feedback(effects).await;
        assert!(matches!(
            fed_back.as_slice(),
            [TodoAction::SnapshotSaved { revision: 1 }]
        ));

        for action in fed_back {
            let more = TodoReducer::new().reduce(&mut state, action, &persistent_env());
            assertions::assert_no_effects(&more);
        }
        assert_eq!(state.saved_revision, 1);
        assert_eq!(state.revision, 1);
    }

    #[tokio::test]
    async fn test_failed_write_is_recorded_until_a_later_save() {
        let env = create_test_env().with_snapshots(Arc::new(BrokenDisk));
        let (mut state, effects) = ReducerTest::new(TodoReducer::new())
            .with_env(env.clone())
            .given_state(TodoState::new())
            .when_action(create("Buy milk"))
            .run();

        for action in feedback(effects).await {
            let _ = TodoReducer::new().reduce(&mut state, action, &env);
        }
        assert_eq!(
            state.save_failure,
            Some(SaveFailure {
                revision: 1,
                reason: "I/O error: disk full".to_string(),
            })
        );
        assert!(state.last_error.is_none());

        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(state)
            .given_actions([TodoAction::SnapshotSaved { revision: 0 }])
            .when_action(TodoAction::SnapshotSaved { revision: 2 })
            .then_state(|state| {
                assert!(state.save_failure.is_none());
                assert_eq!(state.saved_revision, 2);
            })
            .run();
    }

    #[test]
    fn test_late_failure_does_not_mask_newer_save() {
        ReducerTest::new(TodoReducer::new())
            .with_env(create_test_env())
            .given_state(TodoState::new())
            .given_actions([TodoAction::SnapshotSaved { revision: 3 }])
            .when_action(TodoAction::SnapshotFailed {
                revision: 2,
                reason: "disk full".to_string(),
            })
            .then_state(|state| {
                assert!(state.save_failure.is_none());
                assert_eq!(state.saved_revision, 3);
            })
            .run();
    }

    #[test]
    fn test_event_application() {
        let now = test_clock().now();

        ReducerTest::new(TodoReducer::new())
            .with_env(persistent_env())
            .given_state(TodoState::new())
            .when_action(TodoAction::TodoCreated {
                id: TodoId::new(5),
                title: "Replayed".to_string(),
                created_at: now,
            })
            .then_state(move |state| {
                assert_eq!(state.count(), 1);
                assert_eq!(state.get(TodoId::new(5)).unwrap().created_at, now);
                assert_eq!(state.next_id, Some(6));
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(String),
        Toggle(u64),
        Delete(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[ a-z]{0,8}".prop_map(Op::Add),
            (1u64..12).prop_map(Op::Toggle),
            (1u64..12).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn counts_and_ids_stay_consistent(ops in prop::collection::vec(op(), 0..40)) {
            let reducer = TodoReducer::new();
            let env = create_test_env();
            let mut state = TodoState::new();
            let mut issued = Vec::new();

            for op in ops {
                let action = match op {
                    Op::Add(title) => TodoAction::CreateTodo { title },
                    Op::Toggle(id) => TodoAction::ToggleTodo { id: TodoId::new(id) },
                    Op::Delete(id) => TodoAction::DeleteTodo { id: TodoId::new(id) },
                };
                let before = state.next_id;
                let _ = reducer.reduce(&mut state, action, &env);
                if state.next_id != before {
                    issued.push(before.unwrap());
                }

                prop_assert!(state.completed_count() <= state.count());
                prop_assert_eq!(
                    state.completed_count(),
                    state.items().iter().filter(|t| t.completed).count()
                );
                let next = state.next_id.unwrap();
                prop_assert!(state.todos.keys().all(|id| id.get() < next));
                prop_assert!(state.items().iter().all(|t| !t.title.trim().is_empty()));
            }

            // Every issued id is strictly greater than the one before
            prop_assert!(issued.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
