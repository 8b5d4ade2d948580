mod cli;

pub use cli::{Assignment, Cli, ColorChoice};
