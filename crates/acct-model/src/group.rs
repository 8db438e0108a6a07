//! Group names.
//!
//! Groups are free-form authorization tags. Only [`ADMINS_GROUP`] carries
//! meaning inside the service.

use std::collections::BTreeSet;

/// The privileged administrators group.
pub const ADMINS_GROUP: &str = "ADMINS";

/// Normalizes caller-supplied group names.
///
/// Names are trimmed, blanks are dropped and duplicates collapse while the
/// first-seen order is kept, so each name is acted on exactly once.
#[must_use]
pub fn normalize_group_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref().trim();
            (!name.is_empty() && seen.insert(name.to_string())).then(|| name.to_string())
        })
        .collect()
}
