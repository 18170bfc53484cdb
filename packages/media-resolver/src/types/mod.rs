//! Data types shared by every stage of media resolution.

pub mod config;
pub mod context;
pub mod media;
pub mod result;
