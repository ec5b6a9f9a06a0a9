pub mod app_state;
pub mod config;
pub mod modules;
pub mod shared;

pub use app_state::AppState;
pub use modules::{comment, follow, hashtag, like, message, notification, post, story, user};

#[cfg(test)]
mod tests;
