pub mod chat;
pub mod config;
pub mod images;
pub mod inspect;
pub mod note;
pub mod repack;
pub mod utils;
