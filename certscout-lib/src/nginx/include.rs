use super::strip_comment;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Nested includes deeper than this are skipped with a warning.
pub const MAX_INCLUDE_DEPTH: usize = 8;

#[allow(clippy::expect_used)] // literal pattern
static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*include\s+([^\s;]+)\s*;").expect("include pattern compiles")
});

/// Absolute paths pass through; relative ones are joined to `root_dir` when
/// one is known and otherwise left relative to the working directory.
pub(crate) fn resolve_relative(target: &str, root_dir: Option<&Path>) -> PathBuf {
    match root_dir {
        Some(root) if !target.starts_with('/') => root.join(target),
        _ => PathBuf::from(target),
    }
}

/// Replace every `include` line with the comment-stripped, non-empty lines of
/// the files its glob pattern matches, recursively.
pub(super) fn expand_includes(lines: Vec<String>, root_dir: Option<&Path>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(lines.len());
    expand_into(lines, root_dir, 0, &mut expanded);
    expanded
}

fn expand_into(lines: Vec<String>, root_dir: Option<&Path>, depth: usize, out: &mut Vec<String>) {
    for line in lines {
        let Some(target) = include_target(&line) else {
            out.push(line);
            continue;
        };
        if depth >= MAX_INCLUDE_DEPTH {
            tracing::warn!(include = target, depth, "include nesting too deep, skipped");
            continue;
        }
        let included = read_matches(target, root_dir);
        expand_into(included, root_dir, depth + 1, out);
    }
}

fn include_target(line: &str) -> Option<&str> {
    INCLUDE_DIRECTIVE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn read_matches(target: &str, root_dir: Option<&Path>) -> Vec<String> {
    let pattern = resolve_relative(target, root_dir);
    let pattern = pattern.to_string_lossy();
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(err) => {
            tracing::warn!(pattern = %pattern, error = %err, "invalid include pattern");
            return Vec::new();
        }
    };

    let mut lines = Vec::new();
    for entry in paths {
        let path = match entry {
            Ok(path) => path,
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable include match");
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        match std::fs::read(&path) {
            Ok(data) => {
                tracing::debug!(path = %path.display(), "expanding include");
                let text = String::from_utf8_lossy(&data);
                lines.extend(
                    text.lines()
                        .map(strip_comment)
                        .filter(|line| !line.is_empty())
                        .map(str::to_string),
                );
            }
            Err(err) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %err,
                    "skipping unreadable include"
                );
            }
        }
    }
    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn relative_targets_join_root() {
        assert_eq!(
            resolve_relative("snippets/ssl.conf", Some(Path::new("/etc/nginx"))),
            PathBuf::from("/etc/nginx/snippets/ssl.conf")
        );
        assert_eq!(
            resolve_relative("/abs/x.conf", Some(Path::new("/etc/nginx"))),
            PathBuf::from("/abs/x.conf")
        );
        assert_eq!(resolve_relative("x.conf", None), PathBuf::from("x.conf"));
    }

    #[test]
    fn include_directive_forms() {
        assert_eq!(include_target("  include snippets/*.conf;"), Some("snippets/*.conf"));
        assert_eq!(include_target("include /etc/x.conf ;"), Some("/etc/x.conf"));
        assert_eq!(include_target("includes x;"), None);
        assert_eq!(include_target("include;"), None);
    }

    #[test]
    fn glob_matches_are_spliced_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.conf"), "ssl_certificate a.pem; # first\n\n").unwrap();
        fs::write(dir.path().join("b.conf"), "ssl_certificate b.pem;\n").unwrap();
        let lines = vec![
            "server {".to_string(),
            format!("include {}/*.conf;", dir.path().display()),
            "}".to_string(),
        ];
        let expanded = expand_includes(lines, None);
        assert_eq!(
            expanded,
            vec!["server {", "ssl_certificate a.pem;", "ssl_certificate b.pem;", "}"]
        );
    }

    #[test]
    fn unmatched_include_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let lines = vec![format!("include {}/none/*.conf;", dir.path().display())];
        assert!(expand_includes(lines, None).is_empty());
    }

    #[test]
    fn self_include_stops_at_depth_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loop.conf");
        fs::write(&path, format!("server_name x;\ninclude {};\n", path.display())).unwrap();
        let lines = vec![format!("include {};", path.display())];
        let expanded = expand_includes(lines, None);
        assert_eq!(expanded.len(), MAX_INCLUDE_DEPTH);
        assert!(expanded.iter().all(|l| l == "server_name x;"));
    }
}
