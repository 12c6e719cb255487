//! Text front end: confirmation prompts and rendering of the queue view model.
pub mod prompt;
pub mod render;
