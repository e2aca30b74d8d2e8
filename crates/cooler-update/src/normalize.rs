//! Component folder name normalization
//!
//! Archives from release channels often wrap their content in a folder named
//! `{component_id}-{ref}` instead of `{component_id}`. After a manual
//! extraction the placed folders are ranked against the component id and at
//! most one of them is renamed to the exact id.
//!
//! Rules, in rank order:
//! 1. [`MatchRule::Exact`]: a folder already carries the id, nothing to do.
//! 2. [`MatchRule::PrefixWithSeparator`]: the id followed by `-`, `_` or `.`.
//! 3. [`MatchRule::Substring`]: the id appears anywhere in the name.
//!
//! The first rule with any candidate decides. More than one candidate for
//! that rule is ambiguous and nothing is renamed.

use std::fs;
use std::io;
use std::path::Path;
use tracing::{info, warn};

/// Separators accepted between the component id and a ref suffix
const SEPARATORS: [char; 3] = ['-', '_', '.'];

/// A named folder matching rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    PrefixWithSeparator,
    Substring,
}

impl MatchRule {
    /// Rules in rank order
    pub const RANKED: [MatchRule; 3] = [
        MatchRule::Exact,
        MatchRule::PrefixWithSeparator,
        MatchRule::Substring,
    ];

    /// Check a folder name against this rule
    pub fn matches(self, component_id: &str, name: &str) -> bool {
        match self {
            MatchRule::Exact => name == component_id,
            MatchRule::PrefixWithSeparator => name
                .strip_prefix(component_id)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| SEPARATORS.contains(&c)),
            MatchRule::Substring => name != component_id && name.contains(component_id),
        }
    }
}

/// Outcome of ranking folder names against a component id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizationDecision {
    /// A folder named exactly after the component exists
    AlreadyNormalized,

    /// Rename `from` to the component id
    Rename { from: String, rule: MatchRule },

    /// The deciding rule matched several folders
    Ambiguous {
        rule: MatchRule,
        candidates: Vec<String>,
    },

    /// No folder relates to the component
    NotFound,
}

/// Rank `names` against `component_id` and return a single decision
pub fn decide<S: AsRef<str>>(component_id: &str, names: &[S]) -> NormalizationDecision {
    for rule in MatchRule::RANKED {
        let candidates: Vec<&str> = names
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| rule.matches(component_id, name))
            .collect();

        match (rule, candidates.as_slice()) {
            (_, []) => continue,
            (MatchRule::Exact, _) => return NormalizationDecision::AlreadyNormalized,
            (rule, [single]) => {
                return NormalizationDecision::Rename {
                    from: (*single).to_string(),
                    rule,
                }
            }
            (rule, many) => {
                return NormalizationDecision::Ambiguous {
                    rule,
                    candidates: many.iter().map(|s| s.to_string()).collect(),
                }
            }
        }
    }

    NormalizationDecision::NotFound
}

/// Apply the decision for `candidates` (folder names directly under `root`).
///
/// A rename replaces any existing `root/{component_id}` folder.
pub fn normalize_component_dir<S: AsRef<str>>(
    root: &Path,
    component_id: &str,
    candidates: &[S],
) -> io::Result<NormalizationDecision> {
    let decision = decide(component_id, candidates);

    match &decision {
        NormalizationDecision::Rename { from, rule } => {
            let src = root.join(from);
            let dst = root.join(component_id);
            if dst.exists() {
                remove_path(&dst)?;
            }
            fs::rename(&src, &dst)?;
            info!("Renamed {} -> {} ({:?} match)", from, component_id, rule);
        }
        NormalizationDecision::Ambiguous { rule, candidates } => {
            warn!(
                "Cannot normalize {}: {:?} rule matched {:?}",
                component_id, rule, candidates
            );
        }
        NormalizationDecision::NotFound => {
            warn!("No extracted folder matches {}", component_id);
        }
        NormalizationDecision::AlreadyNormalized => {}
    }

    Ok(decision)
}

/// Remove a file or directory tree
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    if path.is_dir() && !path.is_symlink() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
