// Story lifetime
pub const STORY_LIFETIME_HOURS: i64 = 24;

// Pagination defaults
pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

// Replies loaded eagerly under each top-level comment
pub const DEFAULT_REPLIES_PREVIEW: u64 = 3;

// Field limits (characters)
pub const USERNAME_MIN_LEN: usize = 3;
pub const USERNAME_MAX_LEN: usize = 50;
pub const EMAIL_MAX_LEN: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 6;
pub const FULL_NAME_MAX_LEN: usize = 100;
pub const BIO_MAX_LEN: usize = 500;
pub const WEBSITE_MAX_LEN: usize = 100;
pub const LOCATION_MAX_LEN: usize = 100;
pub const URL_MAX_LEN: usize = 255;
pub const CAPTION_MAX_LEN: usize = 2200;
pub const COMMENT_MAX_LEN: usize = 1000;
pub const MESSAGE_MAX_LEN: usize = 5000;
pub const STORY_CAPTION_MAX_LEN: usize = 500;
pub const HASHTAG_MAX_LEN: usize = 100;
