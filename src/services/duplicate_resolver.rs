//! Duplicate detection for Linkvault.
//!
//! Groups bookmarks by a normalized URL key so that entries differing only in
//! scheme/host case, a leading `www.`, or a trailing slash collapse together.
//! Resolution keeps the most recently created member of each group; marking
//! and deleting duplicates are separate steps so a caller can review the scan
//! result before committing to removal.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::types::bookmark::Bookmark;
use crate::types::import::{CandidateBookmark, DuplicateGroup};

/// Trait defining duplicate detection operations.
pub trait DuplicateResolverTrait {
    fn normalize_url(&self, url: &str) -> String;
    fn find_groups(&self, bookmarks: &[Bookmark]) -> Vec<DuplicateGroup>;
    /// Splits a group into the member to keep and the members to remove.
    fn resolve(&self, group: &DuplicateGroup) -> (Bookmark, Vec<Bookmark>);
    /// Collapses normalized-URL repeats within a single import batch.
    fn dedupe_batch(&self, candidates: Vec<CandidateBookmark>) -> Vec<CandidateBookmark>;
}

/// Duplicate resolver implementation.
pub struct DuplicateResolver;

impl DuplicateResolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DuplicateResolverTrait for DuplicateResolver {
    /// Canonicalizes a URL for duplicate comparison.
    ///
    /// Scheme and host are lowercased, a leading `www.` is dropped from the
    /// host, and a single trailing slash is removed. Unparseable input falls
    /// back to a lowercased, slash-trimmed copy of the raw string.
    fn normalize_url(&self, url: &str) -> String {
        let mut normalized = match Url::parse(url.trim()) {
            Ok(mut parsed) => {
                if let Some(host) = parsed.host_str() {
                    let bare = host.strip_prefix("www.").unwrap_or(host).to_string();
                    // set_host rejects hosts for some opaque schemes; the
                    // original (already lowercased) host stays in that case
                    let _ = parsed.set_host(Some(&bare));
                }
                parsed.to_string()
            }
            Err(_) => url.trim().to_lowercase(),
        };
        if normalized.ends_with('/') {
            normalized.pop();
        }
        normalized
    }

    /// Returns only groups with at least two members, ordered by key.
    fn find_groups(&self, bookmarks: &[Bookmark]) -> Vec<DuplicateGroup> {
        let mut by_key: HashMap<String, Vec<Bookmark>> = HashMap::new();
        for bookmark in bookmarks {
            let key = self.normalize_url(&bookmark.url);
            by_key.entry(key).or_default().push(bookmark.clone());
        }

        let mut groups: Vec<DuplicateGroup> = by_key
            .into_iter()
            .filter(|(_, members)| members.len() >= 2)
            .map(|(key, bookmarks)| DuplicateGroup { key, bookmarks })
            .collect();
        groups.sort_by(|a, b| a.key.cmp(&b.key));
        groups
    }

    /// Keeps the member with the latest creation timestamp. Ties keep the
    /// earliest-listed member so resolution is stable.
    fn resolve(&self, group: &DuplicateGroup) -> (Bookmark, Vec<Bookmark>) {
        let mut keep_index = 0;
        for (index, bookmark) in group.bookmarks.iter().enumerate() {
            if bookmark.created_at > group.bookmarks[keep_index].created_at {
                keep_index = index;
            }
        }

        let keep = group.bookmarks[keep_index].clone();
        let remove = group
            .bookmarks
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != keep_index)
            .map(|(_, bookmark)| bookmark.clone())
            .collect();
        (keep, remove)
    }

    /// First occurrence of each normalized URL wins — import candidates carry
    /// no timestamps, so file order decides.
    fn dedupe_batch(&self, candidates: Vec<CandidateBookmark>) -> Vec<CandidateBookmark> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let key = self.normalize_url(&candidate.url);
            if seen.insert(key) {
                kept.push(candidate);
            }
        }
        kept
    }
}
