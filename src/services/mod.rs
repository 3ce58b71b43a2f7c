pub mod compose;
pub mod download;
pub mod search;
pub mod thumbnails;
