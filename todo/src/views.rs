//! HTML rendering.
//!
//! Templates and the stylesheet are compiled into the binary. All template
//! output is HTML-escaped, so titles are shown exactly as typed.

use crate::types::TodoItem;
use minijinja::{AutoEscape, Environment, Error};
use serde::Serialize;
use todo_web::FlashMessage;

/// Source of the list page template
pub const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Stylesheet served at `/static/style.css`
pub const STYLESHEET: &str = include_str!("../static/style.css");

const INDEX: &str = "index.html";

/// Data for the list page
#[derive(Debug, Serialize)]
pub struct IndexPage<'a> {
    /// Items in creation order
    pub todos: &'a [TodoItem],
    /// Number of items
    pub total: usize,
    /// Number of completed items
    pub completed: usize,
    /// Flash messages to show once
    pub messages: &'a [FlashMessage],
}

/// Compiled templates
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// Compile all templates.
    ///
    /// # Errors
    ///
    /// Returns the template syntax error, if any.
    pub fn new() -> Result<Self, Error> {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        env.add_template(INDEX, INDEX_TEMPLATE)?;
        Ok(Self { env })
    }

    /// Render the list page.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    pub fn render_index(&self, page: &IndexPage<'_>) -> Result<String, Error> {
        self.env.get_template(INDEX)?.render(page)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::types::TodoId;
    use todo_core::environment::Clock;
    use todo_testing::test_clock;
    use todo_web::FlashLevel;

    fn item(id: u64, title: &str, completed: bool) -> TodoItem {
        let mut item = TodoItem::new(TodoId::new(id), title.to_string(), test_clock().now());
        item.set_completed(completed, test_clock().now());
        item
    }

    fn render(todos: &[TodoItem], messages: &[FlashMessage]) -> String {
        let page = IndexPage {
            todos,
            total: todos.len(),
            completed: todos.iter().filter(|t| t.completed).count(),
            messages,
        };
        Views::new().unwrap().render_index(&page).unwrap()
    }

    #[test]
    fn empty_list_shows_placeholder() {
        let html = render(&[], &[]);
        assert!(html.contains("No todos yet"));
        assert!(html.contains("Total: 0 · Completed: 0"));
        assert!(!html.contains("todo-list"));
    }

    #[test]
    fn items_render_with_actions() {
        let todos = [item(1, "Buy milk", false), item(2, "Walk dog", true)];
        let html = render(&todos, &[]);

        assert!(html.contains("Total: 2 · Completed: 1"));
        assert!(html.contains("action=\"/complete/1\""));
        assert!(html.contains("action=\"/delete/2\""));
        assert!(html.contains("class=\"todo completed\""));
        assert!(html.contains("Mark incomplete"));
        assert!(html.contains(">Complete<"));
        assert!(!html.contains("No todos yet"));
        assert!(html.find("Buy milk").unwrap() < html.find("Walk dog").unwrap());
    }

    #[test]
    fn titles_are_escaped() {
        let html = render(&[item(1, "<script>alert(1)</script>", false)], &[]);
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn flash_messages_carry_their_level() {
        let messages = [FlashMessage {
            level: FlashLevel::Warning,
            message: "Please enter a todo title.".to_string(),
        }];
        let html = render(&[], &messages);
        assert!(html.contains("flash flash-warning"));
        assert!(html.contains("Please enter a todo title."));
    }

    #[test]
    fn stylesheet_strikes_completed_titles() {
        assert!(STYLESHEET.contains("line-through"));
    }
}
