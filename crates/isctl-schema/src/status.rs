use serde::{Deserialize, Serialize};

/// Status of an instance as reported by qlist.
///
/// This is classification only: transitions happen as a side effect of
/// external start/stop actions and are observed by re-querying.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    /// Blank or unrecognized status.
    #[default]
    Unknown,
    Running,
    /// Up, but sign-ons are inhibited because of a problem.
    Inhibited,
    /// Up, sign-ons inhibited while the primary mirror member is determined.
    PrimaryTransition,
    Down,
    /// Up, but the non-critical `cache.ids` (or `iris.ids`) file is missing.
    /// Both spellings map here; the variant always renders with `cache.ids`.
    MissingIds,
}

const RUNNING: &str = "running";
const INHIBITED: &str = "sign-on inhibited";
const PRIMARY_TRANSITION: &str = "sign-on inhibited:primary transition";
const DOWN: &str = "down";
const MISSING_IDS: &str = "running on node ? (cache.ids missing)";
const MISSING_IRIS_IDS: &str = "running on node ? (iris.ids missing)";

impl InstanceStatus {
    /// Classify a status token. Matching is case-insensitive; anything
    /// unrecognized is `Unknown`.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_lowercase().as_str() {
            RUNNING => Self::Running,
            INHIBITED => Self::Inhibited,
            PRIMARY_TRANSITION => Self::PrimaryTransition,
            DOWN => Self::Down,
            MISSING_IDS | MISSING_IRIS_IDS => Self::MissingIds,
            _ => Self::Unknown,
        }
    }

    /// Canonical tool string. `MissingIds` is always the `cache.ids` form, so
    /// an IRIS instance's `iris.ids` text does not survive a round trip.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Running => RUNNING,
            Self::Inhibited => INHIBITED,
            Self::PrimaryTransition => PRIMARY_TRANSITION,
            Self::Down => DOWN,
            Self::MissingIds => MISSING_IDS,
        }
    }

    pub fn handled(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Code can be executed in the instance.
    pub fn ready(self) -> bool {
        matches!(self, Self::Running | Self::MissingIds)
    }

    /// Any up status, including unclean ones like sign-on inhibited.
    pub fn up(self) -> bool {
        !matches!(self, Self::Unknown | Self::Down)
    }

    pub fn down(self) -> bool {
        matches!(self, Self::Down)
    }

    /// Stopping from this status needs the `bypass` flag.
    pub fn requires_bypass(self) -> bool {
        matches!(self, Self::Inhibited | Self::PrimaryTransition)
    }
}

impl std::fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

impl From<String> for InstanceStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<InstanceStatus> for String {
    fn from(s: InstanceStatus) -> Self {
        s.as_str().to_owned()
    }
}
