//! Regrouping of flat joined rows.

use joinery_core::GroupedRow;

/// Move every `prefix<divider>rest` key of `row` into a nested row under
/// `prefix`.
///
/// Keys are split on the first divider only, so `rest` may still contain
/// dividers. Keys without the divider stay where they are; new groups are
/// appended in the order their first key was seen. `None` passes through.
pub fn group_item(row: Option<GroupedRow>, divider: &str) -> Option<GroupedRow> {
    let mut row = row?;
    if divider.is_empty() {
        return Some(row);
    }

    let flat: Vec<String> = row
        .keys()
        .filter(|key| key.contains(divider))
        .map(str::to_string)
        .collect();

    for key in flat {
        let Some((prefix, rest)) = key.split_once(divider) else {
            continue;
        };
        if let Some(entry) = row.remove(&key) {
            row.nest(prefix, rest, entry);
        }
    }

    Some(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinery_core::{Row, RowEntry, Value};

    fn flat(pairs: &[(&str, i32)]) -> GroupedRow {
        let (names, values): (Vec<_>, Vec<_>) = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::Int(*v)))
            .unzip();
        GroupedRow::from(Row::new(names, values))
    }

    #[test]
    fn test_groups_prefixed_keys() {
        let grouped = group_item(Some(flat(&[("a.b", 1), ("a.c", 2), ("d", 3)])), ".").unwrap();

        let keys: Vec<_> = grouped.keys().collect();
        assert_eq!(keys, vec!["d", "a"]);
        assert_eq!(grouped.value("d"), Some(&Value::Int(3)));

        let a = grouped.nested("a").unwrap();
        assert_eq!(a.value("b"), Some(&Value::Int(1)));
        assert_eq!(a.value("c"), Some(&Value::Int(2)));
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_none_passes_through() {
        assert!(group_item(None, ".").is_none());
    }

    #[test]
    fn test_single_level_only() {
        let grouped = group_item(Some(flat(&[("u.profile.city", 7)])), ".").unwrap();
        let u = grouped.nested("u").unwrap();
        assert_eq!(u.value("profile.city"), Some(&Value::Int(7)));
        assert!(u.nested("profile").is_none());
    }

    #[test]
    fn test_custom_divider() {
        let grouped = group_item(Some(flat(&[("id", 1), ("u__id", 2), ("u.x", 3)])), "__").unwrap();
        assert_eq!(grouped.nested("u").unwrap().value("id"), Some(&Value::Int(2)));
        assert_eq!(grouped.value("u.x"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_scalar_collision_merges_into_group() {
        let grouped = group_item(Some(flat(&[("u", 9), ("u.id", 2)])), ".").unwrap();
        let u = grouped.nested("u").unwrap();
        assert_eq!(u.value(""), Some(&Value::Int(9)));
        assert_eq!(u.value("id"), Some(&Value::Int(2)));
        assert!(matches!(grouped.get("u"), Some(RowEntry::Nested(_))));
    }

    #[test]
    fn test_rows_without_divider_untouched() {
        let row = flat(&[("id", 1), ("title", 2)]);
        assert_eq!(group_item(Some(row.clone()), "."), Some(row));
    }
}
