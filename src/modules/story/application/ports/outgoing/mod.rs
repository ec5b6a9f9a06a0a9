mod story_repository;

pub use story_repository::{NewStory, StoryRepository};
