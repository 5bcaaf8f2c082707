//! Per-document reference registry.
//!
//! Tracks reference definitions and their rewritten forms for one filter run:
//!
//! - original definitions (`old`), used as the embed fallback
//! - rewritten definitions (`new`) produced by import or export
//! - imported definitions, emitted in insertion order at the end of the document
//! - imported `(link, title)` pairs, so an identical image is imported once
//! - reference-style image uses, to spot orphaned exports
//! - exported definitions and the files they were written to

use std::collections::HashMap;

/// Target of a reference definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefTarget {
    /// Link destination.
    pub link: String,
    /// Title, empty when absent.
    pub title: String,
}

impl RefTarget {
    /// Create a target.
    pub fn new(link: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
        }
    }
}

/// Reference definitions and usages for a single document.
#[derive(Debug, Default)]
pub struct RefRegistry {
    old_defs: HashMap<String, RefTarget>,
    new_defs: HashMap<String, RefTarget>,
    imported_defs: Vec<(String, RefTarget)>,
    imported_index: HashMap<String, usize>,
    imported_links: HashMap<(String, String), String>,
    image_refs: HashMap<String, String>,
    exported_refs: Vec<(String, String)>,
}

impl RefRegistry {
    /// Record an original definition. The first definition of a key wins.
    ///
    /// Returns `false` if the key was already defined.
    pub fn define(&mut self, key: &str, target: RefTarget) -> bool {
        if self.old_defs.contains_key(key) {
            return false;
        }
        self.old_defs.insert(key.to_owned(), target);
        true
    }

    /// Record the rewritten form of a definition.
    pub fn rewrite(&mut self, key: &str, target: RefTarget) {
        self.new_defs.insert(key.to_owned(), target);
    }

    /// Original definition for `key`.
    pub fn original(&self, key: &str) -> Option<&RefTarget> {
        self.old_defs.get(key)
    }

    /// Rewritten definition for `key`.
    pub fn rewritten(&self, key: &str) -> Option<&RefTarget> {
        self.new_defs.get(key)
    }

    /// Rewritten definition if present, otherwise the original.
    pub fn resolve(&self, key: &str) -> Option<&RefTarget> {
        self.rewritten(key).or_else(|| self.original(key))
    }

    /// Key under which `(link, title)` was already imported.
    pub fn imported_key(&self, link: &str, title: &str) -> Option<&str> {
        self.imported_links
            .get(&(link.to_owned(), title.to_owned()))
            .map(String::as_str)
    }

    /// Imported definition for `key`.
    pub fn imported(&self, key: &str) -> Option<&RefTarget> {
        self.imported_index
            .get(key)
            .map(|&index| &self.imported_defs[index].1)
    }

    /// Register an imported image under `key`.
    ///
    /// `link` and `title` are the original pair that was imported.
    pub fn register_import(&mut self, key: &str, target: RefTarget, link: &str, title: &str) {
        match self.imported_index.get(key) {
            Some(&index) => self.imported_defs[index].1 = target,
            None => {
                self.imported_index
                    .insert(key.to_owned(), self.imported_defs.len());
                self.imported_defs.push((key.to_owned(), target));
            }
        }
        self.imported_links
            .insert((link.to_owned(), title.to_owned()), key.to_owned());
    }

    /// First of `base`, `base-2`, `base-3`... not used by an imported definition.
    pub fn unique_import_key(&self, base: &str) -> String {
        if !self.imported_index.contains_key(base) {
            return base.to_owned();
        }
        (2..)
            .map(|n| format!("{base}-{n}"))
            .find(|candidate| !self.imported_index.contains_key(candidate))
            .unwrap_or_else(|| base.to_owned())
    }

    /// Imported definitions in insertion order.
    pub fn imported_definitions(&self) -> impl Iterator<Item = (&str, &RefTarget)> {
        self.imported_defs
            .iter()
            .map(|(key, target)| (key.as_str(), target))
    }

    /// Record a reference-style image use.
    pub fn use_image(&mut self, key: &str, alt: &str) {
        self.image_refs.insert(key.to_owned(), alt.to_owned());
    }

    /// Whether a reference-style image with `key` has been seen.
    pub fn is_image_used(&self, key: &str) -> bool {
        self.image_refs.contains_key(key)
    }

    /// Record a definition exported to `path`.
    pub fn record_export(&mut self, key: &str, path: &str) {
        self.exported_refs.push((key.to_owned(), path.to_owned()));
    }

    /// Exported definitions never used by an image reference.
    pub fn orphan_exports(&self) -> impl Iterator<Item = (&str, &str)> {
        self.exported_refs
            .iter()
            .filter(|(key, _)| !self.image_refs.contains_key(key))
            .map(|(key, path)| (key.as_str(), path.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_definition_wins() {
        let mut refs = RefRegistry::default();
        assert!(refs.define("fig", RefTarget::new("a.png", "")));
        assert!(!refs.define("fig", RefTarget::new("b.png", "")));
        assert_eq!(refs.original("fig").unwrap().link, "a.png");
    }

    #[test]
    fn test_resolve_prefers_rewritten() {
        let mut refs = RefRegistry::default();
        refs.define("fig", RefTarget::new("data:image/png;base64,AA==", ""));
        assert_eq!(refs.resolve("fig").unwrap().link, "data:image/png;base64,AA==");

        refs.rewrite("fig", RefTarget::new("images/fig.png", "Figure"));
        assert_eq!(refs.resolve("fig").unwrap().link, "images/fig.png");
        assert_eq!(refs.resolve("other"), None);
    }

    #[test]
    fn test_import_deduplication() {
        let mut refs = RefRegistry::default();
        let target = RefTarget::new("data:image/png;base64,AA==", "file=a.png");
        refs.register_import("a.png", target.clone(), "a.png", "");

        assert_eq!(refs.imported_key("a.png", ""), Some("a.png"));
        assert_eq!(refs.imported_key("a.png", "other title"), None);
        assert_eq!(refs.imported("a.png"), Some(&target));
    }

    #[test]
    fn test_unique_import_key() {
        let mut refs = RefRegistry::default();
        assert_eq!(refs.unique_import_key("a.png"), "a.png");

        refs.register_import("a.png", RefTarget::new("x", ""), "dir1/a.png", "");
        assert_eq!(refs.unique_import_key("a.png"), "a.png-2");

        refs.register_import("a.png-2", RefTarget::new("y", ""), "dir2/a.png", "");
        assert_eq!(refs.unique_import_key("a.png"), "a.png-3");
    }

    #[test]
    fn test_imported_definitions_keep_insertion_order() {
        let mut refs = RefRegistry::default();
        refs.register_import("zeta", RefTarget::new("z", ""), "z.png", "");
        refs.register_import("alpha", RefTarget::new("a", ""), "a.png", "");

        let keys: Vec<&str> = refs.imported_definitions().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_orphan_exports() {
        let mut refs = RefRegistry::default();
        refs.record_export("used", "images/used.png");
        refs.record_export("unused", "images/unused.png");
        refs.use_image("used", "Used");

        let orphans: Vec<_> = refs.orphan_exports().collect();
        assert_eq!(orphans, vec![("unused", "images/unused.png")]);
        assert!(refs.is_image_used("used"));
    }
}
