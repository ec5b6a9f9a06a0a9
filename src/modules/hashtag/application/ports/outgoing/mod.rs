mod hashtag_repository;

pub use hashtag_repository::HashtagRepository;
