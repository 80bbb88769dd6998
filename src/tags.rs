//! Tag Set
//!
//! Normalized listing tags. Tags are trimmed, lowercased and kept sorted without
//! duplicates, so "Vintage" and "vintage" are the same tag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smallvec::SmallVec;

/// A sorted, deduplicated set of lowercase tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    tags: SmallVec<[String; 5]>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a tag set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        tags.iter().copied().collect()
    }

    /// Check if this set contains a tag, ignoring case.
    pub fn contains(&self, tag: &str) -> bool {
        normalize(tag).is_some_and(|tag| self.tags.binary_search(&tag).is_ok())
    }

    /// Add a tag. Blank tags are ignored.
    pub fn add(&mut self, tag: &str) {
        let Some(tag) = normalize(tag) else {
            return;
        };

        if let Err(pos) = self.tags.binary_search(&tag) {
            self.tags.insert(pos, tag);
        }
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Whether the set has no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Iterate over tags in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl<'s> FromIterator<&'s str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
        let mut tags = Self::empty();

        for tag in iter {
            tags.add(tag);
        }

        tags
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for TagSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tags = Vec::<String>::deserialize(deserializer)?;

        Ok(tags.iter().map(String::as_str).collect())
    }
}

fn normalize(tag: &str) -> Option<String> {
    let trimmed = tag.trim();

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
