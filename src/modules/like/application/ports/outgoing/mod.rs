mod like_repository;

pub use like_repository::LikeRepository;
