use crate::{Product, SchemaError};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

pub const DATABASES_SECTION: &str = "[Databases]";

// Trailing deprecated flags on a database line, e.g. `USER=/db/user/,,,,1`.
static DEPRECATED_FLAGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(,[0-9]*)+$").expect("valid flag regex"));

static CURRENT_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*CurrentDirectory=(.+)$").expect("valid journal regex"));

static ALTERNATE_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*AlternateDirectory=(.+)$").expect("valid journal regex"));

/// Which journal directory setting to look up in a CPF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalDirectory {
    Current,
    Alternate,
}

impl JournalDirectory {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Current => &CURRENT_DIRECTORY,
            Self::Alternate => &ALTERNATE_DIRECTORY,
        }
    }
}

/// Collect the `[Databases]` section of a CPF file as database name → DAT path.
///
/// The section ends at the first blank line or the next section header.
pub fn parse_databases<R: BufRead>(
    reader: R,
    product: Product,
) -> Result<BTreeMap<String, PathBuf>, SchemaError> {
    let mut databases = BTreeMap::new();
    let mut in_section = false;
    let mut found = false;

    for line in reader.lines() {
        let line = line?;
        if !in_section {
            if line.trim() == DATABASES_SECTION {
                in_section = true;
                found = true;
            }
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('[') {
            break;
        }

        let stripped = DEPRECATED_FLAGS.replace(trimmed, "");
        if let Some((name, dir)) = stripped.split_once('=') {
            let path = Path::new(dir.trim()).join(product.dat_file_name());
            databases.insert(name.trim().to_owned(), path);
        }
    }

    if !found {
        return Err(SchemaError::SectionNotFound(DATABASES_SECTION.to_owned()));
    }
    Ok(databases)
}

pub fn load_databases(
    cpf_path: impl AsRef<Path>,
    product: Product,
) -> Result<BTreeMap<String, PathBuf>, SchemaError> {
    let file = File::open(cpf_path)?;
    parse_databases(BufReader::new(file), product)
}

/// Find the configured journal directory anywhere in a CPF file.
pub fn find_journal_directory<R: BufRead>(
    reader: R,
    which: JournalDirectory,
) -> Result<String, SchemaError> {
    let pattern = which.pattern();
    for line in reader.lines() {
        let line = line?;
        if let Some(caps) = pattern.captures(&line) {
            return Ok(caps[1].to_owned());
        }
    }
    Err(SchemaError::PatternNotFound(pattern.as_str().to_owned()))
}

pub fn load_journal_directory(
    cpf_path: impl AsRef<Path>,
    which: JournalDirectory,
) -> Result<String, SchemaError> {
    let file = File::open(cpf_path)?;
    find_journal_directory(BufReader::new(file), which)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CPF: &str = "[ConfigFile]
Version=2016.2

[Databases]
CACHESYS=/usr/cachesys/mgr/
CACHELIB=/usr/cachesys/mgr/cachelib/,,,,1
USER=/usr/cachesys/mgr/user/

[Journal]
AlternateDirectory=/jrnl/alt/
CurrentDirectory=/jrnl/cur/
FileSizeLimit=1024
";

    #[test]
    fn parses_database_section() {
        let dbs = parse_databases(CPF.as_bytes(), Product::Cache).unwrap();
        assert_eq!(dbs.len(), 3);
        assert_eq!(
            dbs["CACHESYS"],
            PathBuf::from("/usr/cachesys/mgr/CACHE.DAT")
        );
        assert_eq!(
            dbs["CACHELIB"],
            PathBuf::from("/usr/cachesys/mgr/cachelib/CACHE.DAT")
        );
        assert_eq!(dbs["USER"], PathBuf::from("/usr/cachesys/mgr/user/CACHE.DAT"));
    }

    #[test]
    fn iris_databases_use_iris_dat() {
        let dbs = parse_databases(CPF.as_bytes(), Product::Iris).unwrap();
        assert_eq!(dbs["USER"], PathBuf::from("/usr/cachesys/mgr/user/IRIS.DAT"));
    }

    #[test]
    fn lines_before_header_are_ignored() {
        let cpf = "USER=/nope/\n[Databases]\nUSER=/yes/\n";
        let dbs = parse_databases(cpf.as_bytes(), Product::Cache).unwrap();
        assert_eq!(dbs["USER"], PathBuf::from("/yes/CACHE.DAT"));
    }

    #[test]
    fn section_ends_at_blank_line() {
        let cpf = "[Databases]\nA=/a/\n\nB=/b/\n";
        let dbs = parse_databases(cpf.as_bytes(), Product::Cache).unwrap();
        assert!(dbs.contains_key("A"));
        assert!(!dbs.contains_key("B"));
    }

    #[test]
    fn missing_section_is_not_found() {
        let err = parse_databases("[Journal]\n".as_bytes(), Product::Cache).unwrap_err();
        assert!(matches!(err, SchemaError::SectionNotFound(_)));
    }

    #[test]
    fn empty_section_is_not_an_error() {
        let dbs = parse_databases("[Databases]\n\n".as_bytes(), Product::Cache).unwrap();
        assert!(dbs.is_empty());
    }

    #[test]
    fn finds_journal_directories() {
        let cur = find_journal_directory(CPF.as_bytes(), JournalDirectory::Current).unwrap();
        assert_eq!(cur, "/jrnl/cur/");
        let alt = find_journal_directory(CPF.as_bytes(), JournalDirectory::Alternate).unwrap();
        assert_eq!(alt, "/jrnl/alt/");
    }

    #[test]
    fn missing_journal_directory_is_not_found() {
        let err =
            find_journal_directory("[Journal]\n".as_bytes(), JournalDirectory::Current).unwrap_err();
        assert!(matches!(err, SchemaError::PatternNotFound(_)));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.cpf");
        std::fs::write(&path, CPF).unwrap();
        assert_eq!(load_databases(&path, Product::Cache).unwrap().len(), 3);
        assert_eq!(
            load_journal_directory(&path, JournalDirectory::Current).unwrap(),
            "/jrnl/cur/"
        );
        assert!(load_databases(dir.path().join("missing.cpf"), Product::Cache).is_err());
    }
}
