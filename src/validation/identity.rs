use crate::models::{ExpectedIdentity, NameParts};
use log::debug;

/// Outcome of comparing the account holder's name with the card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameMatch {
    Matched,
    Mismatched { expected: String, found: String },
    /// No expected name was supplied.
    NotChecked,
}

impl NameMatch {
    pub fn is_mismatch(&self) -> bool {
        matches!(self, NameMatch::Mismatched { .. })
    }

    pub fn warning(&self) -> Option<String> {
        match self {
            NameMatch::Mismatched { expected, found } if found.is_empty() => Some(format!(
                "Could not read a name on the ID to compare with your account name ({}).",
                expected
            )),
            NameMatch::Mismatched { expected, found } => Some(format!(
                "Name on ID ({}) does not match your account name ({}).",
                found, expected
            )),
            _ => None,
        }
    }
}

pub struct IdentityChecker;

impl IdentityChecker {
    /// Every supplied expected name must be found on the card. Order on the
    /// card does not matter: a name may match the first or last name in
    /// either containment direction, or appear anywhere in the full names.
    pub fn check(expected: &ExpectedIdentity, found: Option<&NameParts>) -> NameMatch {
        if expected.is_empty() {
            return NameMatch::NotChecked;
        }

        let mismatch = || NameMatch::Mismatched {
            expected: expected.display_name(),
            found: found.map(|n| n.full_names.clone()).unwrap_or_default(),
        };
        let Some(names) = found else {
            debug!("No names extracted, cannot confirm identity");
            return mismatch();
        };

        let all_match = [expected.first_name.as_deref(), expected.last_name.as_deref()]
            .into_iter()
            .flatten()
            .all(|name| Self::name_matches(name, names));

        if all_match {
            NameMatch::Matched
        } else {
            debug!(
                "Expected '{}' not found in '{}'",
                expected.display_name(),
                names.full_names
            );
            mismatch()
        }
    }

    fn name_matches(expected: &str, names: &NameParts) -> bool {
        let expected = expected.trim().to_uppercase();
        if expected.is_empty() {
            return true;
        }

        let part_matches = |part: &Option<String>| {
            part.as_deref()
                .map(|p| p.trim().to_uppercase())
                .filter(|p| !p.is_empty())
                .map_or(false, |p| p.contains(&expected) || expected.contains(&p))
        };

        part_matches(&names.first_name)
            || part_matches(&names.last_name)
            || names.full_names.to_uppercase().contains(&expected)
    }
}
