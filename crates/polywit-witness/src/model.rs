use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Source location key: file base name without extension, plus line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub file: String,
    pub line: u32,
}

impl Position {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Position for a path-like file name (`src/Main.java` -> `Main`).
    pub fn from_path(file: &str, line: u32) -> Self {
        Self::new(file_identifier(file), line)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Base name without extension, for both `/` and `\` separated paths.
pub fn file_identifier(path: &str) -> &str {
    let base = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match base.rfind('.') {
        Some(0) | None => base,
        Some(dot) => &base[..dot],
    }
}

/// An assumption after value extraction. `value: None` is the null literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assumption {
    pub position: Position,
    pub value: Option<String>,
}

impl Assumption {
    pub fn new(position: Position, value: Option<String>) -> Self {
        Self { position, value }
    }
}

/// Non-deterministic call sites and the value type each one produces.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NondetSiteMap {
    sites: IndexMap<Position, String>,
}

impl NondetSiteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a site, replacing the type of an existing entry.
    pub fn insert(&mut self, position: Position, value_type: impl Into<String>) -> Option<String> {
        self.sites.insert(position, value_type.into())
    }

    pub fn get(&self, position: &Position) -> Option<&str> {
        self.sites.get(position).map(String::as_str)
    }

    pub fn contains(&self, position: &Position) -> bool {
        self.sites.contains_key(position)
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Position, &str)> {
        self.sites.iter().map(|(p, t)| (p, t.as_str()))
    }

    /// Lines recorded for `file`, in insertion order.
    pub fn lines_in(&self, file: &str) -> impl Iterator<Item = u32> + '_ {
        let file = file.to_owned();
        self.sites
            .keys()
            .filter(move |p| p.file == file)
            .map(|p| p.line)
    }
}

impl FromIterator<(Position, String)> for NondetSiteMap {
    fn from_iter<T: IntoIterator<Item = (Position, String)>>(iter: T) -> Self {
        Self {
            sites: iter.into_iter().collect(),
        }
    }
}

/// Ordered values to inject into the harness oracle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilteredAssumptions(Vec<Option<String>>);

impl FilteredAssumptions {
    pub fn new(values: Vec<Option<String>>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
