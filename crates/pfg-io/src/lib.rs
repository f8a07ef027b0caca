//! Reading patch description files.

pub mod patch_lexer;
pub mod reader;

pub use reader::{get_patch, parse_header, read_surface, read_surface_file, read_surface_with, LoadOutcome, ReadOptions};
