//! Attachment classes
//!
//! A class groups marks (or bases) that share one position relative to
//! their counterpart. For each counterpart the first member whose pair is
//! not excepted is the leader; its manual position drives the other linked
//! members. Pairs listed in `exceptPairs` are unlinked and keep their own
//! positions.

use super::membership::{first_matching, MembershipExpander};
use super::pair::{pair_key, PositioningPair};
use crate::font_source::{CharacterIndex, GlyphData};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Which role the class members play
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    /// Members are marks sharing one position on each base
    Mark,
    /// Members are bases sharing one position for each mark
    Base,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentClass {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ClassKind,
    /// Member patterns; the first expanded member is the default leader
    pub members: Vec<String>,
    /// `"baseName-markName"` keys of pairs unlinked from the class
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub except_pairs: BTreeSet<String>,
    /// Counterparts the class governs; empty means all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applies: Vec<String>,
    /// Counterparts the class never governs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<String>,
}

impl AttachmentClass {
    pub fn new(name: impl Into<String>, kind: ClassKind, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            members,
            except_pairs: BTreeSet::new(),
            applies: Vec::new(),
            exceptions: Vec::new(),
        }
    }

    /// Key of the pair formed by `member` and `counterpart`
    pub fn member_pair_key(&self, member: &str, counterpart: &str) -> String {
        match self.kind {
            ClassKind::Mark => pair_key(counterpart, member),
            ClassKind::Base => pair_key(member, counterpart),
        }
    }

    /// The member name of `pair` for this class
    pub fn member_of<'p>(&self, pair: &'p PositioningPair) -> &'p str {
        match self.kind {
            ClassKind::Mark => &pair.mark.name,
            ClassKind::Base => &pair.base.name,
        }
    }

    /// The counterpart name of `pair` for this class
    pub fn counterpart_of<'p>(&self, pair: &'p PositioningPair) -> &'p str {
        match self.kind {
            ClassKind::Mark => &pair.base.name,
            ClassKind::Base => &pair.mark.name,
        }
    }
}

/// The first class whose expanded membership includes `character_name`.
/// Classes that expand to nothing are skipped.
pub fn find_class_for<'c>(
    character_name: &str,
    classes: &'c [AttachmentClass],
    expander: &MembershipExpander,
) -> Option<&'c AttachmentClass> {
    first_matching(classes, |class| {
        let members = expander.expand(&class.members);
        !members.is_empty() && members.contains(character_name)
    })
}

/// Whether the class's `applies` / `exceptions` filters admit `counterpart`
pub fn governs(class: &AttachmentClass, counterpart: &str, expander: &MembershipExpander) -> bool {
    let applies = class.applies.is_empty() || expander.contains(&class.applies, counterpart);
    applies && !expander.contains(&class.exceptions, counterpart)
}

/// The first class that includes `member` and whose filters admit
/// `counterpart`. A class that contains the member but excludes the
/// counterpart does not hide later classes.
pub fn find_governing_class<'c>(
    member: &str,
    counterpart: &str,
    classes: &'c [AttachmentClass],
    expander: &MembershipExpander,
) -> Option<&'c AttachmentClass> {
    first_matching(classes, |class| {
        expander.contains(&class.members, member) && governs(class, counterpart, expander)
    })
}

/// The class governing `pair`: the mark's mark class first, then the
/// base's base class.
pub fn class_for_pair<'c>(
    pair: &PositioningPair,
    mark_classes: &'c [AttachmentClass],
    base_classes: &'c [AttachmentClass],
    expander: &MembershipExpander,
) -> Option<&'c AttachmentClass> {
    find_governing_class(&pair.mark.name, &pair.base.name, mark_classes, expander).or_else(|| {
        find_governing_class(&pair.base.name, &pair.mark.name, base_classes, expander)
    })
}

/// The first member whose pair with `counterpart` is not excepted.
///
/// Returns `None` only when every member is excepted or the class is empty.
pub fn effective_leader(
    class: &AttachmentClass,
    counterpart: &str,
    expander: &MembershipExpander,
) -> Option<String> {
    leader_where(class, counterpart, expander, |_| true)
}

/// Like [`effective_leader`], restricted to members accepted by `usable`
/// (e.g. members whose pair is drawn).
pub fn leader_where(
    class: &AttachmentClass,
    counterpart: &str,
    expander: &MembershipExpander,
    mut usable: impl FnMut(&str) -> bool,
) -> Option<String> {
    let members = expander.expand(&class.members);
    first_matching(members.iter(), |&member| {
        !class
            .except_pairs
            .contains(&class.member_pair_key(member, counterpart))
            && usable(member)
    })
    .map(str::to_string)
}

pub fn is_linked(pair: &PositioningPair, class: &AttachmentClass) -> bool {
    !class.except_pairs.contains(&pair.name_key())
}

/// Every pair obtained by substituting each class member into the varying
/// role of `pair` (including `pair` itself), keeping those whose base and
/// mark are drawn and whose ligature is registered.
pub fn siblings_of(
    pair: &PositioningPair,
    class: &AttachmentClass,
    characters: &CharacterIndex,
    glyphs: &BTreeMap<u32, GlyphData>,
    expander: &MembershipExpander,
) -> Vec<PositioningPair> {
    let counterpart = class.counterpart_of(pair);
    let is_drawn = |unicode: u32| glyphs.get(&unicode).is_some_and(GlyphData::is_drawn);

    expander
        .expand(&class.members)
        .iter()
        .filter_map(|member| {
            let sibling = match class.kind {
                ClassKind::Mark => PositioningPair::lookup(counterpart, member, characters),
                ClassKind::Base => PositioningPair::lookup(member, counterpart, characters),
            }?;
            (is_drawn(sibling.base.unicode) && is_drawn(sibling.mark.unicode)).then_some(sibling)
        })
        .collect()
}

/// Return `class` with `pair` unlinked (added to `exceptPairs`) or, if it
/// was already unlinked, relinked.
pub fn toggle_link(pair: &PositioningPair, class: &AttachmentClass) -> AttachmentClass {
    let mut updated = class.clone();
    let key = pair.name_key();
    if !updated.except_pairs.remove(&key) {
        debug!("Unlinking {} from class '{}'", key, class.name);
        updated.except_pairs.insert(key);
    } else {
        debug!("Relinking {} to class '{}'", key, class.name);
    }
    updated
}
