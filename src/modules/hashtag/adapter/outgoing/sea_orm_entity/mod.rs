pub mod hashtags;
pub mod post_hashtags;
