mod hashtag_service;

pub use hashtag_service::HashtagService;
