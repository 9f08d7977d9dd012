//! Frame retention policy.

use crate::client::ObjectInfo;

/// Keys of the objects to delete so that only the newest `keep` remain.
///
/// Objects without a modification time are treated as the oldest. Ties are
/// broken by key so the result is deterministic.
pub fn select_expired(objects: &[ObjectInfo], keep: usize) -> Vec<String> {
    if objects.len() <= keep {
        return Vec::new();
    }

    let mut sorted: Vec<&ObjectInfo> = objects.iter().collect();
    sorted.sort_by(|a, b| {
        a.last_modified
            .cmp(&b.last_modified)
            .then_with(|| a.key.cmp(&b.key))
    });

    let delete_count = objects.len() - keep;
    sorted
        .into_iter()
        .take(delete_count)
        .map(|o| o.key.clone())
        .collect()
}
