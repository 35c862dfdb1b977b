//! Topic definitions and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Named broadcast channels a connection may subscribe to.
///
/// Adding a variant here (plus its name in [`Topic::ALL`]) makes the
/// matching `subscribe_<name>` / `unsubscribe_<name>` frames valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Agent status and performance updates.
    AgentUpdates,
    /// Task progress and log updates.
    TaskUpdates,
}

impl Topic {
    /// Every known topic.
    pub const ALL: [Topic; 2] = [Topic::AgentUpdates, Topic::TaskUpdates];

    /// Parses a wire topic name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    /// Wire name of the topic.
    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::AgentUpdates => "agent_updates",
            Topic::TaskUpdates => "task_updates",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
