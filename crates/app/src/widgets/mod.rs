//! Reusable widgets for the chat window.

pub mod balance_label;
pub mod message_bubble;
pub mod model_selector;

pub use balance_label::balance_label;
pub use message_bubble::{loading_bubble, message_bubble};
pub use model_selector::ModelSelector;
