//! Readable SQL text sources
//!
//! Every ingestion goes through [`SqlSource`]; call sites pick the
//! transport (file, in-memory text, URL).

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

use super::ImportError;

/// A named source of SQL definition text.
pub trait SqlSource {
    /// Name used in logs and in the resulting definition
    fn name(&self) -> String;

    /// Open the source for line-by-line reading.
    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError>;
}

impl<S: SqlSource + ?Sized> SqlSource for &S {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError> {
        (**self).open()
    }
}

impl<S: SqlSource + ?Sized> SqlSource for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError> {
        (**self).open()
    }
}

/// SQL definition file on the local file system
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SqlSource for FileSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError> {
        let file = File::open(&self.path).map_err(|e| {
            ImportError::IoError(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        Ok(Box::new(BufReader::new(file)))
    }
}

/// SQL definition text held in memory
#[derive(Debug, Clone)]
pub struct TextSource {
    name: String,
    text: String,
}

impl TextSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl SqlSource for TextSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError> {
        Ok(Box::new(Cursor::new(self.text.as_bytes())))
    }
}

/// SQL definition fetched over HTTP(S)
#[cfg(feature = "remote-sources")]
#[derive(Debug, Clone)]
pub struct UrlSource {
    url: String,
}

#[cfg(feature = "remote-sources")]
impl UrlSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "remote-sources")]
impl SqlSource for UrlSource {
    fn name(&self) -> String {
        self.url.clone()
    }

    fn open(&self) -> Result<Box<dyn BufRead + '_>, ImportError> {
        let response = reqwest::blocking::get(&self.url)
            .and_then(|r| r.error_for_status())
            .map_err(|e| ImportError::Network(format!("Failed to fetch {}: {}", self.url, e)))?;
        Ok(Box::new(BufReader::new(response)))
    }
}

fn is_url(location: &str) -> bool {
    let lower = location.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Resolve a configured source location.
///
/// `http(s)://` locations become URL sources; anything else is a file path,
/// resolved against `base` when relative.
pub fn from_location(location: &str, base: Option<&Path>) -> Result<Box<dyn SqlSource>, ImportError> {
    if is_url(location) {
        #[cfg(feature = "remote-sources")]
        {
            return Ok(Box::new(UrlSource::new(location)));
        }
        #[cfg(not(feature = "remote-sources"))]
        {
            return Err(ImportError::InvalidSource(format!(
                "{} is a URL; enable the remote-sources feature to read it",
                location
            )));
        }
    }

    let path = Path::new(location);
    let resolved = match base {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    };
    Ok(Box::new(FileSource::new(resolved)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn read_all(source: &dyn SqlSource) -> Vec<String> {
        source
            .open()
            .unwrap()
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_text_source_lines() {
        let source = TextSource::new("inline", "a\nb\r\nc");
        assert_eq!(source.name(), "inline");
        assert_eq!(read_all(&source), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_file_source_reads_and_reports_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tables.sql");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "CREATE TABLE a (").unwrap();
        writeln!(file, ");").unwrap();

        let source = FileSource::new(&path);
        assert_eq!(read_all(&source).len(), 2);

        let missing = FileSource::new(dir.path().join("missing.sql"));
        assert!(matches!(missing.open(), Err(ImportError::IoError(_))));
    }

    #[test]
    fn test_from_location_resolves_relative_paths() {
        let source = from_location("sql/tables.sql", Some(Path::new("/work"))).unwrap();
        assert_eq!(
            PathBuf::from(source.name()),
            Path::new("/work").join("sql/tables.sql")
        );

        let source = from_location("/abs/tables.sql", Some(Path::new("/work"))).unwrap();
        assert_eq!(source.name(), "/abs/tables.sql");
    }

    #[cfg(not(feature = "remote-sources"))]
    #[test]
    fn test_from_location_rejects_urls_without_feature() {
        assert!(matches!(
            from_location("https://example.com/schema.sql", None),
            Err(ImportError::InvalidSource(_))
        ));
    }
}
