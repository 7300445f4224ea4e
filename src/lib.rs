pub mod cli;
pub mod config;
pub mod coverage;
pub mod graph;
pub mod indexer;
pub mod model;
pub mod util;
