//! Tests for #[derive(Action)] macro

use chrono::{DateTime, Utc};
use todo_macros::Action;

#[derive(Action, Clone, Debug, PartialEq)]
enum ListAction {
    #[command]
    AddItem { title: String },

    #[command]
    ToggleItem(u64),

    #[command]
    ClearAll,

    #[event]
    ItemAdded {
        id: u64,
        title: String,
        at: DateTime<Utc>,
    },

    #[event]
    ItemToggled(u64, bool),

    #[event]
    Cleared,

    // Neither a command nor an event
    Refresh,
}

#[test]
fn test_is_command() {
    let action = ListAction::AddItem {
        title: "Buy milk".to_string(),
    };
    assert!(action.is_command());
    assert!(!action.is_event());
}

#[test]
fn test_is_event() {
    let action = ListAction::ItemAdded {
        id: 1,
        title: "Buy milk".to_string(),
        at: Utc::now(),
    };
    assert!(!action.is_command());
    assert!(action.is_event());
}

#[test]
fn test_event_type() {
    let action = ListAction::ItemAdded {
        id: 1,
        title: "Buy milk".to_string(),
        at: Utc::now(),
    };
    assert_eq!(action.event_type(), "ItemAdded.v1");
    assert_eq!(ListAction::ItemToggled(1, true).event_type(), "ItemToggled.v1");
    assert_eq!(ListAction::Cleared.event_type(), "Cleared.v1");
}

#[test]
fn test_command_event_type() {
    // Commands don't have event types
    assert_eq!(ListAction::ToggleItem(3).event_type(), "unknown");
}

#[test]
fn test_tuple_and_unit_variants() {
    assert!(ListAction::ToggleItem(3).is_command());
    assert!(ListAction::ClearAll.is_command());
    assert!(ListAction::ItemToggled(3, false).is_event());
    assert!(ListAction::Cleared.is_event());
}

#[test]
fn test_unmarked_variant() {
    let action = ListAction::Refresh;
    assert!(!action.is_command());
    assert!(!action.is_event());
    assert_eq!(action.event_type(), "unknown");
}
