//! Chat surfaces for EdBot: the interactive terminal and markdown rendering.

pub mod cli;
pub mod markdown;

pub use cli::CliChannel;
pub use markdown::{markdown_to_html, markdown_to_terminal};
