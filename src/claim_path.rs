// Copyright 2020-2024 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt::Display;

use crate::Disclosure;

/// A single step of a [`ClaimPath`]: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClaimPathSegment {
  /// An object property name.
  Name(String),
  /// An array index.
  Index(usize),
}

impl Display for ClaimPathSegment {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      // RFC 6901 escaping, as `~` and `/` may appear in claim names.
      ClaimPathSegment::Name(name) => f.write_str(&name.replace('~', "~0").replace('/', "~1")),
      ClaimPathSegment::Index(index) => write!(f, "{index}"),
    }
  }
}

/// An ordered sequence of object-key and array-index steps identifying a node
/// in a JSON tree. The empty path denotes the payload root.
///
/// Two paths compare by step-wise equality.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ClaimPath(Vec<ClaimPathSegment>);

impl ClaimPath {
  /// The path of the payload root.
  pub fn root() -> Self {
    Self(Vec::new())
  }

  /// Returns a new path with an object-key step appended.
  pub fn claim(&self, name: impl Into<String>) -> Self {
    let mut segments = self.0.clone();
    segments.push(ClaimPathSegment::Name(name.into()));
    Self(segments)
  }

  /// Returns a new path with an array-index step appended.
  pub fn array_element(&self, index: usize) -> Self {
    let mut segments = self.0.clone();
    segments.push(ClaimPathSegment::Index(index));
    Self(segments)
  }

  /// The path of the enclosing container, or `None` for the root.
  pub fn parent(&self) -> Option<Self> {
    if self.0.is_empty() {
      None
    } else {
      Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }
  }

  pub fn segments(&self) -> &[ClaimPathSegment] {
    &self.0
  }

  pub fn is_root(&self) -> bool {
    self.0.is_empty()
  }
}

impl Display for ClaimPath {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for segment in &self.0 {
      write!(f, "/{segment}")?;
    }
    Ok(())
  }
}

impl FromIterator<ClaimPathSegment> for ClaimPath {
  fn from_iter<I: IntoIterator<Item = ClaimPathSegment>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

/// Records, for every claim path visited during recreation, the disclosures
/// consumed on the walk from the payload root to that path (inclusive).
///
/// A node is selectively disclosed iff its entry is strictly longer than its
/// parent's.
#[derive(Debug, Clone, Default)]
pub struct DisclosureLedger {
  entries: HashMap<ClaimPath, Vec<Disclosure>>,
}

impl DisclosureLedger {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn record(&mut self, path: ClaimPath, trail: Vec<Disclosure>) {
    self.entries.insert(path, trail);
  }

  /// The disclosures consumed between the root and `path`, root-first.
  /// Empty for paths that were not visited.
  pub fn disclosures(&self, path: &ClaimPath) -> &[Disclosure] {
    self.entries.get(path).map(Vec::as_slice).unwrap_or_default()
  }

  /// The number of disclosures consumed between the root and `path`.
  pub fn depth(&self, path: &ClaimPath) -> usize {
    self.disclosures(path).len()
  }

  /// Whether the node at `path` was itself inserted through a disclosure.
  pub fn is_selectively_disclosed(&self, path: &ClaimPath) -> bool {
    let parent_depth = path.parent().map(|parent| self.depth(&parent)).unwrap_or(0);
    self.depth(path) > parent_depth
  }

  pub fn iter(&self) -> impl Iterator<Item = (&ClaimPath, &[Disclosure])> {
    self.entries.iter().map(|(path, trail)| (path, trail.as_slice()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
