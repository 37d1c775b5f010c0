/// Duplicate file detection: size first, then full-content hash.
///
/// Files with a unique size cannot have a duplicate, so only files that
/// share their exact byte size with at least one other file are hashed.
/// The grouping itself is a pure function over the scan's records; the
/// hashing in between is driven by the aggregator's worker pool.
use crate::model::{DuplicateGroup, FileRecord, Fingerprint};
use std::collections::HashMap;

/// Indices into `records` of the files that need a fingerprint.
///
/// With `size_gate` on, these are the readable files whose size is shared
/// with another readable file. With it off, every readable file is a
/// candidate. Indices are returned in ascending (discovery) order.
pub fn hash_candidates(records: &[FileRecord], size_gate: bool) -> Vec<usize> {
    if !size_gate {
        return (0..records.len()).filter(|&i| records[i].readable).collect();
    }

    let mut by_size: HashMap<u64, u32> = HashMap::with_capacity(records.len());
    for record in records.iter().filter(|r| r.readable) {
        *by_size.entry(record.size).or_insert(0) += 1;
    }

    (0..records.len())
        .filter(|&i| records[i].readable && by_size.get(&records[i].size).is_some_and(|&n| n >= 2))
        .collect()
}

/// Group fingerprinted, readable records into duplicate sets.
///
/// Members keep discovery order. Singleton buckets are dropped. Groups are
/// ordered by reclaimable bytes descending, then fingerprint ascending.
pub fn find_duplicates(records: &[FileRecord]) -> Vec<DuplicateGroup> {
    let mut buckets: HashMap<(u64, Fingerprint), Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        if !record.readable {
            continue;
        }
        if let Some(fp) = record.fingerprint {
            buckets.entry((record.size, fp)).or_default().push(i);
        }
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, members)| members.len() >= 2)
        .map(|((size, fingerprint), members)| DuplicateGroup {
            fingerprint,
            size,
            members: members.into_iter().map(|i| records[i].path.clone()).collect(),
        })
        .collect();

    sort_groups(&mut groups);
    groups
}

/// Highest cleanup value first; fingerprint order makes ties deterministic.
pub fn sort_groups(groups: &mut [DuplicateGroup]) {
    groups.sort_by(|a, b| {
        b.reclaimable_size()
            .cmp(&a.reclaimable_size())
            .then(a.fingerprint.cmp(&b.fingerprint))
            .then(a.size.cmp(&b.size))
    });
}
