use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// How many branches an activator may register in one invocation.
///
/// - `Free`: any subset of the declared labels, including none or all.
/// - `ExactlyOne`: exactly one label; anything else fails the run once the
///   body returns, before any branch is unblocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum BranchDiscipline {
    Free,
    ExactlyOne,
}

impl Default for BranchDiscipline {
    fn default() -> Self {
        BranchDiscipline::Free
    }
}

impl BranchDiscipline {
    /// Whether `registered` labels satisfy this discipline.
    pub fn accepts(self, registered: usize) -> bool {
        match self {
            BranchDiscipline::Free => true,
            BranchDiscipline::ExactlyOne => registered == 1,
        }
    }
}

impl FromStr for BranchDiscipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(BranchDiscipline::Free),
            "exactly_one" | "exactly-one" | "one" => Ok(BranchDiscipline::ExactlyOne),
            other => Err(format!(
                "invalid branch discipline: {other} (expected \"free\" or \"exactly_one\")"
            )),
        }
    }
}

impl TryFrom<String> for BranchDiscipline {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for BranchDiscipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchDiscipline::Free => f.write_str("free"),
            BranchDiscipline::ExactlyOne => f.write_str("exactly_one"),
        }
    }
}

/// Structural rule on a task's position in the static graph.
///
/// Constraints are checked right before the task runs and look only at the
/// declared graph, never at which dynamic branches happen to be active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Constraint {
    /// The task must not be a dynamic activator.
    MustBeStatic,
    /// The task must have no static successors.
    MustHaveNoOutgoingEdges,
    /// The task must have no static predecessors.
    MustHaveNoIncomingEdges,
}

impl FromStr for Constraint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "must_be_static" | "static" => Ok(Constraint::MustBeStatic),
            "must_have_no_outgoing_edges" | "no_outgoing" => {
                Ok(Constraint::MustHaveNoOutgoingEdges)
            }
            "must_have_no_incoming_edges" | "no_incoming" => {
                Ok(Constraint::MustHaveNoIncomingEdges)
            }
            other => Err(format!(
                "invalid constraint: {other} (expected \"must_be_static\", \
                 \"must_have_no_outgoing_edges\" or \"must_have_no_incoming_edges\")"
            )),
        }
    }
}

impl TryFrom<String> for Constraint {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Constraint::MustBeStatic => "must_be_static",
            Constraint::MustHaveNoOutgoingEdges => "must_have_no_outgoing_edges",
            Constraint::MustHaveNoIncomingEdges => "must_have_no_incoming_edges",
        };
        f.write_str(s)
    }
}
