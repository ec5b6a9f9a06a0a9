pub mod comment;
pub mod follow;
pub mod hashtag;
pub mod like;
pub mod message;
pub mod notification;
pub mod post;
pub mod story;
pub mod user;
