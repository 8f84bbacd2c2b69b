//! Name pattern expansion
//!
//! Rules and classes list characters with three kinds of tokens:
//! - `name`: a literal character name
//! - `@group`: every entry of a named group (entries may be patterns too)
//! - `$key`: every character of the character set named `key`, plus every
//!   character whose glyph class is `key` (e.g. `$mark`)

use crate::font_source::CharacterSet;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;

/// Named groups of character patterns, keyed without the `@` prefix
pub type Groups = BTreeMap<String, Vec<String>>;

/// Return the first candidate accepted by `predicate`.
///
/// Rule lookup (first match wins) and leader selection (first member that
/// is not excepted) both go through here.
pub fn first_matching<I, P>(candidates: I, mut predicate: P) -> Option<I::Item>
where
    I: IntoIterator,
    P: FnMut(&I::Item) -> bool,
{
    candidates.into_iter().find(|candidate| predicate(candidate))
}

/// An insertion-ordered set of character names
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameSet {
    names: Vec<String>,
    lookup: HashSet<String>,
}

impl NameSet {
    pub fn insert(&mut self, name: &str) {
        if self.lookup.insert(name.to_string()) {
            self.names.push(name.to_string());
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn first(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Expand a pattern list into concrete character names.
pub fn expand_patterns(
    patterns: &[String],
    groups: &Groups,
    character_sets: &[CharacterSet],
) -> NameSet {
    let mut names = NameSet::default();
    let mut visiting = Vec::new();
    for pattern in patterns {
        expand_token(pattern, groups, character_sets, &mut visiting, &mut names);
    }
    names
}

fn expand_token<'a>(
    token: &'a str,
    groups: &'a Groups,
    character_sets: &[CharacterSet],
    visiting: &mut Vec<&'a str>,
    names: &mut NameSet,
) {
    if let Some(group_name) = token.strip_prefix('@') {
        if visiting.contains(&group_name) {
            debug!("Group @{} references itself, skipping", group_name);
            return;
        }
        let Some(entries) = groups.get(group_name) else {
            debug!("Unknown group @{}", group_name);
            return;
        };
        visiting.push(group_name);
        for entry in entries {
            expand_token(entry, groups, character_sets, visiting, names);
        }
        visiting.pop();
    } else if let Some(key) = token.strip_prefix('$') {
        for set in character_sets {
            for character in &set.characters {
                let in_set = set.name == key;
                let in_class = character.glyph_class.is_some_and(|class| class.as_str() == key);
                if in_set || in_class {
                    names.insert(&character.name);
                }
            }
        }
    } else {
        names.insert(token);
    }
}

/// Memoizing pattern expander bound to one set of groups and character sets.
///
/// The cache key is a stable serialization of the pattern list; since the
/// expander borrows its dictionaries, they cannot change while cached
/// results are alive.
pub struct MembershipExpander<'a> {
    groups: &'a Groups,
    character_sets: &'a [CharacterSet],
    cache: RefCell<HashMap<String, Rc<NameSet>>>,
}

impl<'a> MembershipExpander<'a> {
    pub fn new(groups: &'a Groups, character_sets: &'a [CharacterSet]) -> Self {
        Self {
            groups,
            character_sets,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn expand(&self, patterns: &[String]) -> Rc<NameSet> {
        let key = patterns.join("\u{1f}");
        if let Some(cached) = self.cache.borrow().get(&key) {
            return Rc::clone(cached);
        }
        let expanded = Rc::new(expand_patterns(patterns, self.groups, self.character_sets));
        self.cache.borrow_mut().insert(key, Rc::clone(&expanded));
        expanded
    }

    pub fn contains(&self, patterns: &[String], name: &str) -> bool {
        self.expand(patterns).contains(name)
    }

    pub fn groups(&self) -> &'a Groups {
        self.groups
    }

    pub fn character_sets(&self) -> &'a [CharacterSet] {
        self.character_sets
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font_source::{Character, GlyphClass};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn fixtures() -> (Groups, Vec<CharacterSet>) {
        let mut groups = Groups::new();
        groups.insert("nasals".to_string(), strings(&["n", "m"]));
        groups.insert("round".to_string(), strings(&["o", "@nasals"]));
        groups.insert("loop".to_string(), strings(&["x", "@loop"]));
        let sets = vec![
            CharacterSet {
                name: "consonants".to_string(),
                characters: vec![Character::new("n", 0x6E), Character::new("m", 0x6D)],
            },
            CharacterSet {
                name: "marks".to_string(),
                characters: vec![
                    Character::new("tilde", 0x303).with_class(GlyphClass::Mark),
                    Character::new("macron", 0x304).with_class(GlyphClass::Mark),
                ],
            },
        ];
        (groups, sets)
    }

    #[test]
    fn test_expands_literals_groups_and_classes() {
        let (groups, sets) = fixtures();
        let names = expand_patterns(&strings(&["a", "@round", "$mark"]), &groups, &sets);
        let listed: Vec<_> = names.iter().collect();
        assert_eq!(listed, vec!["a", "o", "n", "m", "tilde", "macron"]);

        let consonants = expand_patterns(&strings(&["$consonants"]), &groups, &sets);
        assert!(consonants.contains("n") && consonants.contains("m"));
        assert_eq!(consonants.len(), 2);
    }

    #[test]
    fn test_unknown_and_cyclic_groups_are_tolerated() {
        let (groups, sets) = fixtures();
        assert!(expand_patterns(&strings(&["@missing", "$missing"]), &groups, &sets).is_empty());
        let looped = expand_patterns(&strings(&["@loop"]), &groups, &sets);
        assert_eq!(looped.iter().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let (groups, sets) = fixtures();
        let names = expand_patterns(&strings(&["m", "@nasals"]), &groups, &sets);
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["m", "n"]);
    }

    #[test]
    fn test_expander_memoizes_by_pattern_list() {
        let (groups, sets) = fixtures();
        let expander = MembershipExpander::new(&groups, &sets);
        let first = expander.expand(&strings(&["@round"]));
        let second = expander.expand(&strings(&["@round"]));
        assert!(Rc::ptr_eq(&first, &second));
        assert!(expander.contains(&strings(&["$mark"]), "macron"));
        assert_eq!(expander.cached_entries(), 2);
    }

    #[test]
    fn test_first_matching_returns_first_accepted() {
        let found = first_matching(vec![1, 4, 6, 8], |n| n % 2 == 0);
        assert_eq!(found, Some(4));
        assert_eq!(first_matching(Vec::<i32>::new(), |_| true), None);
    }
}
