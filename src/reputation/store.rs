//! Immutable ASN / organization reputation set.

use std::collections::{HashMap, HashSet};

use crate::geo::normalize_asn;

/// One row of the reputation dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReputationEntry {
    /// Normalized `AS<digits>` token, if the row names one.
    pub asn: Option<String>,
    /// Lowercase organization fragment, if the row names one.
    pub organization: Option<String>,
    pub category: Option<String>,
}

impl ReputationEntry {
    /// Normalize a raw row. Rows with neither an ASN nor an organization
    /// yield `None`.
    pub fn new(asn: &str, organization: &str, category: Option<&str>) -> Option<Self> {
        let asn = normalize_asn(asn);
        let organization = Some(organization.trim().to_lowercase()).filter(|o| !o.is_empty());
        if asn.is_none() && organization.is_none() {
            return None;
        }
        Some(Self {
            asn,
            organization,
            category: category
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// What caused a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReputationMatch {
    Asn { asn: String, category: Option<String> },
    Organization { fragment: String, category: Option<String> },
}

/// Read-only reputation set, built once and never mutated.
#[derive(Debug, Default)]
pub struct ReputationStore {
    asns: HashMap<String, Option<String>>,
    organizations: Vec<(String, Option<String>)>,
}

impl ReputationStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a store from entries. Duplicate entries collapse, so the
    /// result depends only on the set of entries, not their order.
    pub fn from_entries(entries: impl IntoIterator<Item = ReputationEntry>) -> Self {
        let mut asns: HashMap<String, Option<String>> = HashMap::new();
        let mut organizations: HashMap<String, Option<String>> = HashMap::new();

        for entry in entries {
            if let Some(asn) = entry.asn {
                merge_category(asns.entry(asn).or_default(), entry.category.clone());
            }
            if let Some(org) = entry.organization {
                merge_category(organizations.entry(org).or_default(), entry.category);
            }
        }

        let mut organizations: Vec<_> = organizations.into_iter().collect();
        organizations.sort();

        Self { asns, organizations }
    }

    pub fn len(&self) -> usize {
        self.asns.len() + self.organizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asns.is_empty() && self.organizations.is_empty()
    }

    /// Exact ASN match or organization-substring match; absent or empty
    /// inputs never match.
    pub fn is_blocked(&self, asn: Option<&str>, organization: Option<&str>) -> bool {
        self.find_match(asn, organization).is_some()
    }

    /// Like `is_blocked`, but reports which entry matched.
    pub fn find_match(&self, asn: Option<&str>, organization: Option<&str>) -> Option<ReputationMatch> {
        if let Some(asn) = asn.and_then(normalize_asn) {
            if let Some(category) = self.asns.get(&asn) {
                return Some(ReputationMatch::Asn {
                    asn,
                    category: category.clone(),
                });
            }
        }

        let organization = organization.map(|o| o.trim().to_lowercase())?;
        if organization.is_empty() {
            return None;
        }
        self.organizations
            .iter()
            .find(|(fragment, _)| organization.contains(fragment.as_str()))
            .map(|(fragment, category)| ReputationMatch::Organization {
                fragment: fragment.clone(),
                category: category.clone(),
            })
    }

    /// Distinct categories present, for startup logging.
    pub fn categories(&self) -> HashSet<&str> {
        self.asns
            .values()
            .chain(self.organizations.iter().map(|(_, c)| c))
            .filter_map(|c| c.as_deref())
            .collect()
    }
}

// Keep the lexicographically smallest category so duplicates are order-independent.
fn merge_category(slot: &mut Option<String>, category: Option<String>) {
    if let Some(category) = category {
        let replace = match slot {
            Some(existing) => category < *existing,
            None => true,
        };
        if replace {
            *slot = Some(category);
        }
    }
}
