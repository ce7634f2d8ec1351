//! Literal token → replacement map.

/// Ordered map of placeholder tokens to replacements.
///
/// Tokens are applied one after another in insertion order. They are expected
/// to be disjoint; if one token is a substring of another the result depends
/// on the order and is not guaranteed to be meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionMap {
    pairs: Vec<(String, String)>,
}

impl SubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens for a new project: `Template` → `name`, `template` → dashed name.
    pub fn for_project(name: &str) -> Self {
        Self::new()
            .with("Template", name)
            .with("template", dashed_name(name))
    }

    /// Add or replace `token`. Empty tokens are ignored.
    pub fn with(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(token, value);
        self
    }

    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        if token.is_empty() {
            return;
        }
        let value = value.into();
        match self.pairs.iter_mut().find(|(t, _)| *t == token) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((token, value)),
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|(t, _)| t.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// True if `text` contains any token.
    pub fn matches(&self, text: &str) -> bool {
        self.pairs.iter().any(|(t, _)| text.contains(t.as_str()))
    }

    /// Replace every occurrence of every token in `text`.
    pub fn apply(&self, text: &str) -> String {
        self.pairs
            .iter()
            .fold(text.to_string(), |acc, (token, value)| acc.replace(token.as_str(), value))
    }
}

/// `Docker.Tools` → `docker-tools`.
pub fn dashed_name(name: &str) -> String {
    name.to_lowercase().replace('.', "-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_map_has_both_casings() {
        let map = SubstitutionMap::for_project("Docker.Tools");
        assert_eq!(
            map.apply("Nuke.Template.Tests / nuke-template.sln"),
            "Nuke.Docker.Tools.Tests / nuke-docker-tools.sln"
        );
    }

    #[test]
    fn apply_replaces_every_occurrence() {
        let map = SubstitutionMap::new().with("Template", "Foo");
        assert_eq!(map.apply("Template+Template"), "Foo+Foo");
    }

    #[test]
    fn insert_overrides_existing_token() {
        let mut map = SubstitutionMap::new().with("a", "1");
        map.insert("a", "2");
        assert_eq!(map.apply("a"), "2");
        assert_eq!(map.tokens().count(), 1);
    }

    #[test]
    fn empty_token_is_ignored() {
        let map = SubstitutionMap::new().with("", "x");
        assert!(map.is_empty());
        assert_eq!(map.apply("abc"), "abc");
    }

    #[test]
    fn dashed_name_lowercases_and_dashes() {
        assert_eq!(dashed_name("Nuke.Docker.Tools"), "nuke-docker-tools");
    }
}
