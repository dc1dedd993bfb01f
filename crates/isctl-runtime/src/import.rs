use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("the glob must contain at most one **: {0}")]
    TooManyRecursiveDirs(String),
    #[error("there must be a path separator between ** and file pattern: {0}")]
    MissingPathSeparator(String),
    #[error("a ** must only be used as the last portion of the path before the file pattern: {0}")]
    PathAfterRecursiveDirs(String),
    #[error("the directory portion of the glob must not contain wildcards: {0}")]
    WildcardInDirectory(String),
    #[error("cannot resolve the current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

/// A directory import, parsed from a glob with at most one `**`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportDescription {
    pub dir: String,
    pub file_pattern: String,
    pub recursive: bool,
    pub qualifiers: String,
}

impl ImportDescription {
    /// Parse `glob` into a directory and a file pattern.
    ///
    /// `**` may appear once, directly followed by `/` and a bare file
    /// pattern. A glob without a directory resolves against the current
    /// working directory.
    pub fn new(glob: &str, qualifiers: &str) -> Result<Self, ImportError> {
        let pieces: Vec<&str> = glob.split("**").collect();
        let (dir, file_pattern, recursive) = match pieces.as_slice() {
            [single] => (dir_of(single), base_of(single), false),
            [prefix, rest] => {
                if !rest.starts_with('/') {
                    return Err(ImportError::MissingPathSeparator(glob.to_owned()));
                }
                if dir_of(rest) != "/" {
                    return Err(ImportError::PathAfterRecursiveDirs(glob.to_owned()));
                }
                (clean_path(prefix), base_of(rest), true)
            }
            _ => return Err(ImportError::TooManyRecursiveDirs(glob.to_owned())),
        };

        if dir.contains(['*', '?']) {
            return Err(ImportError::WildcardInDirectory(glob.to_owned()));
        }

        let dir = if dir == "." {
            std::env::current_dir()
                .map_err(ImportError::CurrentDir)?
                .to_string_lossy()
                .into_owned()
        } else {
            dir
        };

        Ok(Self {
            dir,
            file_pattern,
            recursive,
            qualifiers: qualifiers.to_owned(),
        })
    }
}

impl fmt::Display for ImportDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"##class(%SYSTEM.OBJ).ImportDir("{}","{}","{}",,{})"#,
            self.dir,
            self.file_pattern,
            self.qualifiers,
            u8::from(self.recursive)
        )
    }
}

/// Resolve `.` and `..` and collapse separators without touching the
/// filesystem. An empty path cleans to `.`.
fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    match (rooted, parts.is_empty()) {
        (true, _) => format!("/{}", parts.join("/")),
        (false, true) => ".".to_owned(),
        (false, false) => parts.join("/"),
    }
}

/// Everything up to the last separator, cleaned.
fn dir_of(path: &str) -> String {
    match path.rfind('/') {
        Some(i) => clean_path(&path[..=i]),
        None => ".".to_owned(),
    }
}

/// The last element of the path, ignoring trailing separators.
fn base_of(path: &str) -> String {
    if path.is_empty() {
        return ".".to_owned();
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_owned();
    }
    match trimmed.rfind('/') {
        Some(i) => trimmed[i + 1..].to_owned(),
        None => trimmed.to_owned(),
    }
}
