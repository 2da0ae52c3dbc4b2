mod graph;
mod writer;

pub use writer::{write_autoconf, write_config, write_suggest, write_values};
