pub mod stories;
pub mod story_views;
