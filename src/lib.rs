pub mod config;
pub mod corridor;
pub mod dedupe;
pub mod direction;
pub mod feed;
pub mod matcher;
pub mod output;
pub mod parser;
pub mod ranker;
pub mod report;
