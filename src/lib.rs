pub mod aggregate;
pub mod cache;
pub mod config;
pub mod digest;
pub mod error;
pub mod merge;
pub mod paginate;
pub mod platform;
pub mod redact;
pub mod report;
pub mod required;
pub mod review;
pub mod session;
pub mod slack;
pub mod timeutil;
