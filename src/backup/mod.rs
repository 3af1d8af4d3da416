pub mod config;
pub mod dedup;
pub mod directive;
pub mod pipeline;
pub mod redacted;
pub mod result_error;
pub mod stage;
pub mod validate;
