//! Suite names and selection.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::error::SuiteError;

/// A named, independently selectable group of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Suite {
    Models,
    Files,
    Vectors,
    Datasets,
    Tools,
    Mcp,
    Team,
}

impl Suite {
    pub const ALL: [Self; 7] = [
        Self::Models,
        Self::Files,
        Self::Vectors,
        Self::Datasets,
        Self::Tools,
        Self::Mcp,
        Self::Team,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Models => "models",
            Self::Files => "files",
            Self::Vectors => "vectors",
            Self::Datasets => "datasets",
            Self::Tools => "tools",
            Self::Mcp => "mcp",
            Self::Team => "team",
        }
    }

    /// Suites that read the shared team fixtures.
    #[must_use]
    pub fn needs_fixtures(self) -> bool {
        matches!(self, Self::Datasets | Self::Team)
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Suite {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|suite| suite.as_str() == s)
            .ok_or_else(|| SuiteError::UnknownSuite {
                name: s.to_owned(),
                known: Self::ALL.map(Self::as_str).join(", "),
            })
    }
}

/// Resolve suite names in canonical order. `all` selects every suite.
///
/// Names may be given separately or comma-separated; blanks are ignored.
///
/// # Errors
///
/// Returns [`SuiteError::UnknownSuite`] for any unrecognized name and
/// [`SuiteError::NoSuites`] when nothing was named.
pub fn parse_suites<S: AsRef<str>>(names: &[S]) -> Result<Vec<Suite>, SuiteError> {
    let mut selected = Vec::new();
    for name in names
        .iter()
        .flat_map(|n| n.as_ref().split(','))
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        if name.eq_ignore_ascii_case("all") {
            selected.extend(Suite::ALL);
        } else {
            selected.push(name.to_ascii_lowercase().parse()?);
        }
    }
    if selected.is_empty() {
        return Err(SuiteError::NoSuites);
    }
    selected.sort_unstable();
    selected.dedup();
    Ok(selected)
}
