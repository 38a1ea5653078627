//! Dotted field-path resolution over [`Value`] trees.

use crate::value::{Member, Value};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Resolves `path` (for example `"detail.age"`) against `item`.
///
/// Records are searched by declared member name. When `alias_key` names a
/// scheme (for example `"json"`), a member tagged with an alias equal to the
/// segment under that scheme wins over the literal name. Dictionaries are
/// searched by key. Any other value, or a missing member or key, resolves to
/// `None`, and `None` propagates to the end of the path.
///
/// Alias lookup scans every member of each record on the path. Callers that
/// resolve the same aliased path in a hot loop should cache the result.
#[must_use]
pub fn resolve<'a>(item: &'a Value, path: &str, alias_key: Option<&str>) -> Option<&'a Value> {
    let alias_key = alias_key.filter(|k| !k.is_empty());
    path.split(PATH_SEPARATOR)
        .try_fold(item, |current, segment| step(current, segment, alias_key))
}

fn step<'a>(current: &'a Value, segment: &str, alias_key: Option<&str>) -> Option<&'a Value> {
    match current {
        Value::Record(record) => alias_key
            .and_then(|scheme| record.member_by_alias(scheme, segment))
            .map(Member::value)
            .or_else(|| record.get(segment)),
        Value::Map(entries) => entries.get(segment),
        _ => None,
    }
}
