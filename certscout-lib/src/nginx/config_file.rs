use super::block::{starts_server_block, ConfigBlock};
use super::strip_comment;
use crate::input::{PathError, CONFIGURATION_FILE};
use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::{Path, PathBuf};

const CONF_D_MARKER: &str = "/nginx/conf.d/";

/// The nginx root directory for a configuration file path: everything before
/// `/nginx/conf.d/` followed by `/nginx`. `None` when the marker is absent.
pub fn root_dir_for(config_path: &Path) -> Option<PathBuf> {
    let text = config_path.to_string_lossy();
    let pos = text.find(CONF_D_MARKER)?;
    let prefix = text.get(..pos)?;
    Some(PathBuf::from(format!("{}/nginx", prefix)))
}

/// One nginx configuration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    path: PathBuf,
    root_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root_dir = root_dir_for(&path);
        ConfigFile { path, root_dir }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base directory for relative include and certificate paths.
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    /// Lazily iterate the file's server blocks. Lines are read as the
    /// iterator advances; the file is closed when it is dropped.
    pub fn blocks(&self) -> Result<ServerBlocks<FileLines>, PathError> {
        let file = File::open(&self.path).map_err(|e| PathError::from_io(&e, CONFIGURATION_FILE))?;
        let lines = FileLines {
            inner: BufReader::new(file).split(b'\n'),
            path: self.path.clone(),
        };
        Ok(ServerBlocks::new(lines, self.root_dir.clone()))
    }
}

/// Lines of a configuration file, decoded lossily.
///
/// A read error ends the sequence early and is logged.
#[derive(Debug)]
pub struct FileLines {
    inner: Split<BufReader<File>>,
    path: PathBuf,
}

impl Iterator for FileLines {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match self.inner.next()? {
            Ok(raw) => Some(String::from_utf8_lossy(&raw).into_owned()),
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "stopped reading configuration file"
                );
                None
            }
        }
    }
}

/// Groups raw configuration lines into [`ConfigBlock`]s.
///
/// Lines before the first `server {` opener belong to no block and are
/// dropped. Blank lines (after comment stripping) are dropped too.
#[derive(Debug)]
pub struct ServerBlocks<I> {
    lines: I,
    current: Option<Vec<String>>,
    root_dir: Option<PathBuf>,
    finished: bool,
}

impl<I> ServerBlocks<I>
where
    I: Iterator<Item = String>,
{
    pub fn new(lines: I, root_dir: Option<PathBuf>) -> Self {
        ServerBlocks {
            lines,
            current: None,
            root_dir,
            finished: false,
        }
    }

    fn finish(&mut self, lines: Vec<String>) -> ConfigBlock {
        ConfigBlock::from_lines(lines, self.root_dir.as_deref())
    }
}

impl ServerBlocks<std::vec::IntoIter<String>> {
    /// Scan configuration text held in memory.
    pub fn from_text(text: &str, root_dir: Option<PathBuf>) -> Self {
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        ServerBlocks::new(lines.into_iter(), root_dir)
    }
}

impl<I> Iterator for ServerBlocks<I>
where
    I: Iterator<Item = String>,
{
    type Item = ConfigBlock;

    fn next(&mut self) -> Option<ConfigBlock> {
        if self.finished {
            return None;
        }
        loop {
            let Some(raw) = self.lines.next() else {
                self.finished = true;
                let last = self.current.take()?;
                return Some(self.finish(last));
            };
            let line = strip_comment(&raw);

            if starts_server_block(line) {
                let completed = self.current.replace(vec![line.to_string()]);
                if let Some(lines) = completed {
                    return Some(self.finish(lines));
                }
                continue;
            }

            if line.is_empty() {
                continue;
            }
            if let Some(current) = self.current.as_mut() {
                current.push(line.to_string());
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn root_dir_from_conf_d_path() {
        assert_eq!(
            root_dir_for(Path::new("/etc/nginx/conf.d/site.conf")),
            Some(PathBuf::from("/etc/nginx"))
        );
        assert_eq!(
            root_dir_for(Path::new("/usr/local/etc/nginx/conf.d/sub/a.conf")),
            Some(PathBuf::from("/usr/local/etc/nginx"))
        );
        assert_eq!(root_dir_for(Path::new("/srv/site.conf")), None);
    }

    #[test]
    fn lines_before_first_server_are_dropped() {
        let text = "user nginx;\nhttp {\nserver {\n  server_name a.example;\n}\n";
        let blocks: Vec<_> = ServerBlocks::from_text(text, None).collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].lines()[0], "server {");
        assert!(!blocks[0].lines().iter().any(|l| l.contains("user nginx")));
    }

    #[test]
    fn each_opener_starts_a_new_block() {
        let text = "server {\n server_name a;\n}\n\n# comment\nserver{\n server_name b;\n}\n";
        let blocks: Vec<_> = ServerBlocks::from_text(text, None).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].server_names(), ["a"]);
        assert_eq!(blocks[1].server_names(), ["b"]);
        assert_eq!(blocks[0].lines().len(), 3);
    }

    #[test]
    fn no_server_block_yields_nothing() {
        let mut blocks = ServerBlocks::from_text("events {}\n", None);
        assert!(blocks.next().is_none());
        assert!(blocks.next().is_none());
    }

    #[test]
    fn missing_file_is_path_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigFile::new(dir.path().join("absent.conf"));
        assert_eq!(
            config.blocks().unwrap_err(),
            PathError::NotFound(CONFIGURATION_FILE)
        );
    }

    #[test]
    fn file_blocks_are_read_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.conf");
        std::fs::write(&path, "server {\r\n  server_name x.example;\r\n}\r\n").unwrap();
        let blocks: Vec<_> = ConfigFile::new(&path).blocks().unwrap().collect();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].server_names(), ["x.example"]);
    }
}
