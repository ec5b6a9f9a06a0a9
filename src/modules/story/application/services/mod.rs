mod story_expiry_sweeper;
mod story_service;

pub use story_expiry_sweeper::StoryExpirySweeper;
pub use story_service::StoryService;
