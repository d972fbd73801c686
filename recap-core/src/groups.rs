//! Group registry for tracking capture groups
//!
//! This module provides a registry that tracks all capture groups in a regex pattern,
//! mapping names to indices and vice versa. This is essential for:
//! - Resolving backreferences by name
//! - Ensuring group names are unique
//! - Naming groups in match results and replacement templates

use crate::ast::GroupRef;
use crate::error::SyntaxErrorKind;
use std::collections::HashMap;

/// Information about a capture group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupInfo {
    /// The ordinal of the group: 0 is the whole match, others count opening
    /// parentheses from the left
    pub index: u32,
    /// The name of the group (if it's a named group)
    pub name: Option<String>,
}

/// Registry for tracking capture groups
///
/// Group 0, the whole match, is always present.
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    /// Group info, indexed by ordinal
    groups: Vec<GroupInfo>,
    /// Map from group name to index
    name_to_index: HashMap<String, u32>,
}

impl GroupRegistry {
    /// Create a registry holding only group 0
    pub fn new() -> Self {
        GroupRegistry {
            groups: vec![GroupInfo {
                index: 0,
                name: None,
            }],
            name_to_index: HashMap::new(),
        }
    }

    /// Register a new capture group and return its ordinal
    ///
    /// # Errors
    /// Returns an error if the name is already in use
    pub fn register_group(&mut self, name: Option<String>) -> Result<u32, SyntaxErrorKind> {
        let index = self.groups.len() as u32;

        if let Some(ref group_name) = name {
            if self.name_to_index.contains_key(group_name) {
                return Err(SyntaxErrorKind::DuplicateGroupName(group_name.clone()));
            }
            self.name_to_index.insert(group_name.clone(), index);
        }

        self.groups.push(GroupInfo { index, name });
        Ok(index)
    }

    /// Get group info by index
    pub fn get_by_index(&self, index: u32) -> Option<&GroupInfo> {
        self.groups.get(index as usize)
    }

    /// Get group index by name
    pub fn get_by_name(&self, name: &str) -> Option<u32> {
        self.name_to_index.get(name).copied()
    }

    /// The name of a group, if it has one
    pub fn name_of(&self, index: u32) -> Option<&str> {
        self.get_by_index(index).and_then(|g| g.name.as_deref())
    }

    /// Resolve a backreference target to a group ordinal
    pub fn resolve(&self, target: &GroupRef) -> Option<u32> {
        match target {
            GroupRef::Number(n) if (*n as usize) < self.groups.len() => Some(*n),
            GroupRef::Number(_) => None,
            GroupRef::Name(name) => self.get_by_name(name),
        }
    }

    /// Validate a backreference target, reporting the undefined group
    pub fn validate(&self, target: &GroupRef) -> Result<u32, SyntaxErrorKind> {
        self.resolve(target).ok_or_else(|| match target {
            GroupRef::Number(n) => SyntaxErrorKind::UndefinedGroupNumber(*n),
            GroupRef::Name(name) => SyntaxErrorKind::UndefinedGroupName(name.clone()),
        })
    }

    /// The number of groups, group 0 included
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Get all group infos, in ordinal order
    pub fn groups(&self) -> &[GroupInfo] {
        &self.groups
    }

    /// Names of the named groups, in ordinal order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(|g| g.name.as_deref())
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_group_zero() {
        let registry = GroupRegistry::new();
        assert_eq!(registry.group_count(), 1);
        assert_eq!(registry.get_by_index(0).unwrap().name, None);
    }

    #[test]
    fn test_register_unnamed_group() {
        let mut registry = GroupRegistry::new();
        let index = registry.register_group(None).unwrap();
        assert_eq!(index, 1);
        assert_eq!(registry.group_count(), 2);
    }

    #[test]
    fn test_register_named_group() {
        let mut registry = GroupRegistry::new();
        let index = registry.register_group(Some("name".to_string())).unwrap();
        assert_eq!(index, 1);
        assert_eq!(registry.get_by_name("name"), Some(1));
        assert_eq!(registry.name_of(1), Some("name"));
    }

    #[test]
    fn test_register_multiple_groups() {
        let mut registry = GroupRegistry::new();
        let idx1 = registry.register_group(Some("first".to_string())).unwrap();
        let idx2 = registry.register_group(None).unwrap();
        let idx3 = registry.register_group(Some("third".to_string())).unwrap();

        assert_eq!((idx1, idx2, idx3), (1, 2, 3));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["first", "third"]);
    }

    #[test]
    fn test_duplicate_name_error() {
        let mut registry = GroupRegistry::new();
        registry.register_group(Some("name".to_string())).unwrap();
        let result = registry.register_group(Some("name".to_string()));
        assert_eq!(
            result,
            Err(SyntaxErrorKind::DuplicateGroupName("name".to_string()))
        );
    }

    #[test]
    fn test_validate_references() {
        let mut registry = GroupRegistry::new();
        registry.register_group(None).unwrap();
        registry.register_group(Some("word".to_string())).unwrap();

        assert_eq!(registry.validate(&GroupRef::Number(1)), Ok(1));
        assert_eq!(registry.validate(&GroupRef::Name("word".to_string())), Ok(2));
        assert_eq!(
            registry.validate(&GroupRef::Number(3)),
            Err(SyntaxErrorKind::UndefinedGroupNumber(3))
        );
        assert_eq!(
            registry.validate(&GroupRef::Name("nope".to_string())),
            Err(SyntaxErrorKind::UndefinedGroupName("nope".to_string()))
        );
    }
}
