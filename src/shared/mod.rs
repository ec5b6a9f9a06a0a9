pub mod clock;
pub mod constants;
pub mod error;
pub mod media;
pub mod pagination;
pub mod patch;
pub mod store;
pub mod store_error;
pub mod tombstone;
pub mod validation;
