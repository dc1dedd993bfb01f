use crate::SchemaError;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

/// Name of the installation parameters file inside an instance directory.
pub const PARAMETERS_FILE: &str = "parameters.isc";

// The group is everything before the last '.' preceding the first ':'.
static PARAMETER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:([^:]+)\.)?([^.:]+):\s*(.*)$").expect("valid parameter line regex")
});

/// A single key from `parameters.isc` with every value recorded for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterEntry {
    /// The portion of the key before the last `.`; empty for ungrouped keys.
    pub group: String,
    pub name: String,
    /// Values in the order they appear in the file.
    pub values: Vec<String>,
}

impl ParameterEntry {
    /// The full `group.name` key, or just `name` for the empty group.
    pub fn key(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.group, self.name)
        }
    }
}

/// Parsed contents of a `parameters.isc` file: group → name → entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParameterStore {
    groups: BTreeMap<String, BTreeMap<String, ParameterEntry>>,
}

impl ParameterStore {
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, SchemaError> {
        let mut store = Self::default();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let caps = PARAMETER_LINE
                .captures(&line)
                .ok_or_else(|| SchemaError::MalformedParameterLine(line.clone()))?;
            let group = caps.get(1).map_or("", |m| m.as_str());
            let name = &caps[2];
            let value = &caps[3];
            store.push(group, name, value);
        }
        Ok(store)
    }

    pub fn parse_str(input: &str) -> Result<Self, SchemaError> {
        Self::parse(input.as_bytes())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }

    fn push(&mut self, group: &str, name: &str, value: &str) {
        self.groups
            .entry(group.to_owned())
            .or_default()
            .entry(name.to_owned())
            .or_insert_with(|| ParameterEntry {
                group: group.to_owned(),
                name: name.to_owned(),
                values: Vec::new(),
            })
            .values
            .push(value.to_owned());
    }

    pub fn entry(&self, group: &str, name: &str) -> Option<&ParameterEntry> {
        self.groups.get(group)?.get(name)
    }

    /// All values for a `group.name` key, or for `name` in the empty group.
    /// Missing keys yield an empty slice.
    pub fn values(&self, key: &str) -> &[String] {
        let (group, name) = split_key(key);
        self.values_in(group, name)
    }

    pub fn values_in(&self, group: &str, name: &str) -> &[String] {
        self.entry(group, name).map_or(&[], |e| e.values.as_slice())
    }

    /// The single value for a key. Returns "" when the key is missing or
    /// holds more than one value.
    pub fn value(&self, key: &str) -> &str {
        single(self.values(key))
    }

    pub fn value_in(&self, group: &str, name: &str) -> &str {
        single(self.values_in(group, name))
    }

    pub fn entries(&self) -> impl Iterator<Item = &ParameterEntry> {
        self.groups.values().flat_map(BTreeMap::values)
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn split_key(key: &str) -> (&str, &str) {
    key.rsplit_once('.').unwrap_or(("", key))
}

fn single(values: &[String]) -> &str {
    match values {
        [one] => one,
        _ => "",
    }
}
