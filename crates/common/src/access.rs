//! The closed access-condition vocabulary.
//!
//! Access conditions arrive as display strings in MODS `accessCondition`
//! elements. The set is closed; anything outside it is a cataloguing error
//! and callers treat it as such. Conditions are totally ordered by how much
//! they restrict access, so a mixed set can be collapsed to its most secure
//! member.

use std::fmt;

/// A validated access condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCondition {
    Open,
    Degraded,
    RequiresRegistration,
    OpenWithAdvisory,
    ClinicalImages,
    RestrictedFiles,
    /// Interim Archivematica spelling of [`AccessCondition::RestrictedFiles`].
    Restricted,
    Closed,
}

impl AccessCondition {
    /// Parses the exact display string used in MODS. Returns `None` for
    /// anything outside the closed vocabulary.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(AccessCondition::Open),
            "Degraded" => Some(AccessCondition::Degraded),
            "Requires registration" => Some(AccessCondition::RequiresRegistration),
            "Open with advisory" => Some(AccessCondition::OpenWithAdvisory),
            "Clinical images" => Some(AccessCondition::ClinicalImages),
            "Restricted files" => Some(AccessCondition::RestrictedFiles),
            "Restricted" => Some(AccessCondition::Restricted),
            "Closed" => Some(AccessCondition::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessCondition::Open => "Open",
            AccessCondition::Degraded => "Degraded",
            AccessCondition::RequiresRegistration => "Requires registration",
            AccessCondition::OpenWithAdvisory => "Open with advisory",
            AccessCondition::ClinicalImages => "Clinical images",
            AccessCondition::RestrictedFiles => "Restricted files",
            AccessCondition::Restricted => "Restricted",
            AccessCondition::Closed => "Closed",
        }
    }

    /// How restrictive the condition is. Distinct conditions can share a
    /// rank; `most_secure` keeps the first of a tied pair it encounters.
    pub fn security_rank(&self) -> u8 {
        match self {
            AccessCondition::Open => 0,
            AccessCondition::Degraded => 1,
            AccessCondition::RequiresRegistration => 2,
            AccessCondition::OpenWithAdvisory => 2,
            AccessCondition::ClinicalImages => 3,
            AccessCondition::RestrictedFiles => 4,
            AccessCondition::Restricted => 4,
            AccessCondition::Closed => 5,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, AccessCondition::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, AccessCondition::Closed)
    }

    /// Collapses a set of conditions to the most restrictive one present.
    /// Returns `None` for an empty set.
    pub fn most_secure<I>(conditions: I) -> Option<AccessCondition>
    where
        I: IntoIterator<Item = AccessCondition>,
    {
        conditions
            .into_iter()
            .reduce(|a, b| if b.security_rank() > a.security_rank() { b } else { a })
    }
}

impl fmt::Display for AccessCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_the_closed_vocabulary() {
        assert_eq!(AccessCondition::parse("Open"), Some(AccessCondition::Open));
        assert_eq!(
            AccessCondition::parse("Requires registration"),
            Some(AccessCondition::RequiresRegistration)
        );
        assert_eq!(AccessCondition::parse("open"), None);
        assert_eq!(AccessCondition::parse("Public"), None);
    }

    #[test]
    fn most_restrictive_wins() {
        let most = AccessCondition::most_secure([
            AccessCondition::Open,
            AccessCondition::Closed,
            AccessCondition::RequiresRegistration,
        ]);
        assert_eq!(most, Some(AccessCondition::Closed));
    }

    #[test]
    fn ties_keep_first_encountered() {
        let most = AccessCondition::most_secure([
            AccessCondition::OpenWithAdvisory,
            AccessCondition::RequiresRegistration,
        ]);
        assert_eq!(most, Some(AccessCondition::OpenWithAdvisory));
    }

    #[test]
    fn empty_set_has_no_most_secure() {
        assert_eq!(AccessCondition::most_secure([]), None);
    }
}
