//! Application services orchestrating domain rules over repository traits.

pub mod content;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod policy;
pub mod repos;
