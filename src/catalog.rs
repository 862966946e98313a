//! The ingredient catalog: canonical names and their aliases.
//!
//! A [`Catalog`] is built from [`CatalogRecord`]s and enforces its
//! invariants at load time:
//!
//! - canonical names are unique,
//! - an alias belongs to at most one entry,
//! - no alias collides with another entry's canonical name.
//!
//! All terms are trimmed and lower-cased on load, matching the lower-casing
//! the normalizer applies to input phrases.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::PantryError;
use crate::models::{CatalogEntry, CatalogRecord};

/// A violation found while validating catalog records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogConflict {
    EmptyName { index: usize },
    DuplicateName { name: String, indices: Vec<usize> },
    SharedAlias { alias: String, owners: Vec<String> },
    AliasShadowsName { alias: String, owner: String },
}

impl fmt::Display for CatalogConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogConflict::EmptyName { index } => {
                write!(f, "record {} has an empty name", index)
            }
            CatalogConflict::DuplicateName { name, indices } => {
                write!(f, "'{}' is defined at records {:?}", name, indices)
            }
            CatalogConflict::SharedAlias { alias, owners } => {
                write!(f, "alias '{}' is claimed by {}", alias, owners.join(", "))
            }
            CatalogConflict::AliasShadowsName { alias, owner } => write!(
                f,
                "alias '{}' of '{}' is also a canonical name",
                alias, owner
            ),
        }
    }
}

pub(crate) fn clean_term(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Validated, in-memory ingredient catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog, rejecting records that break its invariants.
    pub fn from_records(records: Vec<CatalogRecord>) -> Result<Self, PantryError> {
        let conflicts = find_conflicts(&records);
        if !conflicts.is_empty() {
            let detail: Vec<String> = conflicts.iter().map(|c| c.to_string()).collect();
            return Err(PantryError::InvalidCatalog(detail.join("; ")));
        }

        let entries = records
            .into_iter()
            .map(|record| {
                let canonical_name = clean_term(&record.name);
                let aliases: BTreeSet<String> = record
                    .alias
                    .iter()
                    .map(|a| clean_term(a))
                    .filter(|a| !a.is_empty() && *a != canonical_name)
                    .collect();
                CatalogEntry {
                    canonical_name,
                    aliases,
                }
            })
            .collect();

        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every canonical name followed by its aliases, in catalog order.
    pub fn unrolled(&self) -> Vec<String> {
        let mut terms = Vec::new();
        for entry in &self.entries {
            terms.push(entry.canonical_name.clone());
            terms.extend(entry.aliases.iter().cloned());
        }
        terms
    }

    /// Map a vocabulary hit to the canonical name of the entry that owns it.
    ///
    /// Fails with [`PantryError::Integrity`] when no entry owns `hit`.
    pub fn resolve_canonical(&self, hit: &str) -> Result<&str, PantryError> {
        for entry in &self.entries {
            if entry.canonical_name == hit {
                return Ok(&entry.canonical_name);
            }
        }
        self.entries
            .iter()
            .find(|entry| entry.aliases.contains(hit))
            .map(|entry| entry.canonical_name.as_str())
            .ok_or_else(|| PantryError::Integrity {
                term: hit.to_string(),
            })
    }

    fn owner_of(&self, term: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.canonical_name == term || e.aliases.contains(term))
    }

    /// Add a new canonical ingredient with no aliases.
    pub fn add_ingredient(&mut self, name: &str) -> Result<&CatalogEntry, PantryError> {
        let name = clean_term(name);
        if name.is_empty() {
            return Err(PantryError::MalformedInput(
                "ingredient name must not be empty".to_string(),
            ));
        }
        if self.owner_of(&name).is_some() {
            return Err(PantryError::DuplicateIngredient(name));
        }
        self.entries.push(CatalogEntry {
            canonical_name: name,
            aliases: BTreeSet::new(),
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Attach aliases to an existing entry. Returns the aliases that were new.
    ///
    /// Aliases already owned by another entry are rejected as a whole so the
    /// catalog never ends up half-updated.
    pub fn append_aliases(
        &mut self,
        name: &str,
        aliases: &[String],
    ) -> Result<Vec<String>, PantryError> {
        let name = clean_term(name);
        let index = self
            .entries
            .iter()
            .position(|e| e.canonical_name == name)
            .ok_or_else(|| {
                PantryError::MalformedInput(format!("ingredient '{}' not found", name))
            })?;

        let mut added = Vec::new();
        for alias in aliases.iter().map(|a| clean_term(a)) {
            if alias.is_empty() || alias == name || added.contains(&alias) {
                continue;
            }
            match self.owner_of(&alias) {
                Some(owner) if owner.canonical_name == name => continue,
                Some(owner) => {
                    return Err(PantryError::InvalidCatalog(format!(
                        "alias '{}' already belongs to '{}'",
                        alias, owner.canonical_name
                    )))
                }
                None => added.push(alias),
            }
        }

        self.entries[index].aliases.extend(added.iter().cloned());
        Ok(added)
    }

    pub fn to_records(&self) -> Vec<CatalogRecord> {
        self.entries
            .iter()
            .map(|e| CatalogRecord {
                name: e.canonical_name.clone(),
                alias: e.aliases.iter().cloned().collect(),
            })
            .collect()
    }
}

/// Report every invariant violation in `records`, without building a catalog.
pub fn find_conflicts(records: &[CatalogRecord]) -> Vec<CatalogConflict> {
    let mut conflicts = Vec::new();
    let mut name_indices: HashMap<String, Vec<usize>> = HashMap::new();
    let mut name_order: Vec<String> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let name = clean_term(&record.name);
        if name.is_empty() {
            conflicts.push(CatalogConflict::EmptyName { index });
            continue;
        }
        let slot = name_indices.entry(name.clone()).or_default();
        if slot.is_empty() {
            name_order.push(name);
        }
        slot.push(index);
    }

    for name in &name_order {
        let indices = &name_indices[name];
        if indices.len() > 1 {
            conflicts.push(CatalogConflict::DuplicateName {
                name: name.clone(),
                indices: indices.clone(),
            });
        }
    }

    let mut alias_owners: HashMap<String, Vec<String>> = HashMap::new();
    let mut alias_order: Vec<String> = Vec::new();
    for record in records {
        let owner = clean_term(&record.name);
        if owner.is_empty() {
            continue;
        }
        let unique: BTreeSet<String> = record
            .alias
            .iter()
            .map(|a| clean_term(a))
            .filter(|a| !a.is_empty() && *a != owner)
            .collect();
        for alias in unique {
            if name_indices.contains_key(&alias) {
                conflicts.push(CatalogConflict::AliasShadowsName {
                    alias: alias.clone(),
                    owner: owner.clone(),
                });
            }
            let owners = alias_owners.entry(alias.clone()).or_default();
            if owners.is_empty() {
                alias_order.push(alias);
            }
            owners.push(owner.clone());
        }
    }

    for alias in alias_order {
        let owners = &alias_owners[&alias];
        if owners.len() > 1 {
            conflicts.push(CatalogConflict::SharedAlias {
                alias,
                owners: owners.clone(),
            });
        }
    }

    conflicts
}
