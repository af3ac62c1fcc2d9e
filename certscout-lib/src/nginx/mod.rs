//! nginx configuration scanning.
//!
//! A configuration file is read line by line, comments are stripped, and the
//! lines are grouped into `server { ... }` blocks. Each block has its
//! `include` directives expanded before the TLS directives are collected.
//! No attempt is made to understand the full nginx grammar: a block runs from
//! one `server {` opener to the next (or to end of file).

mod block;
mod config_file;
mod include;

pub use block::{ConfigBlock, TlsBinding};
pub use config_file::{root_dir_for, ConfigFile, FileLines, ServerBlocks};
pub use include::MAX_INCLUDE_DEPTH;

pub(crate) use include::resolve_relative;

/// Remove a trailing `#` comment and trailing whitespace from one line.
///
/// A `#` preceded by a backslash is literal and does not start a comment.
pub fn strip_comment(line: &str) -> &str {
    let mut end = line.len();
    let mut prev = None;
    for (idx, ch) in line.char_indices() {
        if ch == '#' && prev != Some('\\') {
            end = idx;
            break;
        }
        prev = Some(ch);
    }
    line.get(..end).unwrap_or(line).trim_end()
}
