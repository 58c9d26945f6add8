use std::collections::HashSet;
use proptest::prelude::*;
use crate::cache::{select_victim, AccessKind, CacheModel, Line};
use crate::config::CacheConfiguration;
use crate::error::ConfigError;

fn model(s: u32, e: usize, b: u32) -> CacheModel {
    CacheModel::new(CacheConfiguration::new(s, e, b).unwrap()).unwrap()
}

fn tags(lines: &[Line]) -> Vec<Option<u64>> {
    lines.iter().map(|line| line.valid.then_some(line.tag)).collect()
}

#[test]
fn new_cache_is_empty() {
    let cache = model(2, 3, 4);
    assert_eq!(cache.valid_line_count(), 0);
    for set in 0..4 {
        assert_eq!(cache.set(set), &[Line::default(); 3]);
    }
    assert_eq!(cache.summary().hits + cache.summary().misses + cache.summary().evictions, 0);
}

#[test]
fn unallocatable_cache_is_an_error() {
    // 2^58 lines fit in isize::MAX bytes, but in no address space
    let config = CacheConfiguration::new(58, 1, 0).unwrap();
    assert!(matches!(CacheModel::new(config), Err(ConfigError::TooLarge { set_index_bits: 58, associativity: 1 })));
}

#[test]
fn decompose_splits_set_and_tag() {
    let cache = model(4, 1, 4);
    assert_eq!(cache.decompose(0x1234), (0x3, 0x12));
    assert_eq!(cache.decompose(0xF), (0, 0));
    assert_eq!(cache.decompose(u64::MAX), (0xF, u64::MAX >> 8));
}

#[test]
fn decompose_full_width_offset_has_no_tag() {
    let mut cache = model(0, 1, 64);
    assert_eq!(cache.decompose(u64::MAX), (0, 0));
    assert_eq!(cache.access(0).kind, AccessKind::Miss);
    assert_eq!(cache.access(u64::MAX).kind, AccessKind::Hit);
}

#[test]
fn repeated_load_hits() {
    let mut cache = model(0, 1, 0);
    assert_eq!(cache.access(0).kind, AccessKind::Miss);
    let outcome = cache.access(0);
    assert!(outcome.kind.is_hit());
    assert_eq!((outcome.summary.hits, outcome.summary.misses, outcome.summary.evictions), (1, 1, 0));
}

#[test]
fn conflicting_tag_evicts_direct_mapped_line() {
    let mut cache = model(0, 1, 0);
    assert_eq!(cache.access(0).kind, AccessKind::Miss);
    let outcome = cache.access(16);
    assert_eq!(outcome.kind, AccessKind::MissEviction);
    assert_eq!((outcome.summary.hits, outcome.summary.misses, outcome.summary.evictions), (0, 2, 1));
    assert_eq!(tags(cache.set(0)), vec![Some(16)]);
}

#[test]
fn offset_bits_share_a_block() {
    let mut cache = model(1, 1, 4);
    assert_eq!(cache.access(0x20).kind, AccessKind::Miss);
    assert_eq!(cache.access(0x2F).kind, AccessKind::Hit);
    // Next block maps to the other set
    assert_eq!(cache.access(0x30).kind, AccessKind::Miss);
    assert_eq!(cache.valid_line_count(), 2);
}

#[test]
fn recency_ages_every_other_line() {
    let mut cache = model(0, 2, 0);
    cache.access(0);
    assert_eq!(cache.set(0)[0], Line { valid: true, tag: 0, recency: 0 });
    assert_eq!(cache.set(0)[1].recency, 1);

    cache.access(1);
    assert_eq!(cache.set(0)[0].recency, 1);
    assert_eq!(cache.set(0)[1], Line { valid: true, tag: 1, recency: 0 });

    assert_eq!(cache.access(0).kind, AccessKind::Hit);
    assert_eq!(cache.set(0)[0].recency, 0);
    assert_eq!(cache.set(0)[1].recency, 1);

    assert_eq!(cache.access(2).kind, AccessKind::MissEviction);
    assert_eq!(cache.set(0), &[Line { valid: true, tag: 0, recency: 1 }, Line { valid: true, tag: 2, recency: 0 }]);
}

#[test]
fn fill_uses_first_invalid_line() {
    let mut cache = model(0, 4, 0);
    for tag in 0..3 {
        cache.access(tag);
    }
    assert_eq!(tags(cache.set(0)), vec![Some(0), Some(1), Some(2), None]);
}

#[test]
fn other_sets_are_untouched() {
    let mut cache = model(1, 2, 0);
    cache.access(0);
    let before = cache.set(1).to_vec();
    cache.access(2);
    cache.access(4);
    assert_eq!(cache.set(1), before.as_slice());
}

#[test]
fn evicts_least_recently_used() {
    let mut cache = model(0, 4, 0);
    for tag in 0..4 {
        assert_eq!(cache.access(tag).kind, AccessKind::Miss);
    }
    for tag in [0, 1, 3] {
        assert_eq!(cache.access(tag).kind, AccessKind::Hit);
    }
    // 2 is now the oldest occupant
    assert_eq!(cache.access(4).kind, AccessKind::MissEviction);
    let present: HashSet<u64> = cache.set(0).iter().map(|line| line.tag).collect();
    assert_eq!(present, HashSet::from([0, 1, 3, 4]));
    assert_eq!(cache.access(2).kind, AccessKind::MissEviction);
    // The reload of 2 replaced 0, the oldest after 2 left
    assert_eq!(cache.access(0).kind, AccessKind::MissEviction);
}

#[test]
fn victim_ties_go_to_lowest_index() {
    let line = |recency| Line { valid: true, tag: 0, recency };
    assert_eq!(select_victim(&[line(3), line(5), line(5), line(1)]), 1);
    assert_eq!(select_victim(&[line(7), line(7), line(7)]), 0);
    assert_eq!(select_victim(&[line(1), line(2), line(9)]), 2);
    assert_eq!(select_victim(&[line(4)]), 0);
}

proptest! {
    #[test]
    fn sets_stay_within_capacity_with_unique_tags(
        s in 0u32..4,
        e in 1usize..5,
        b in 0u32..4,
        addresses in prop::collection::vec(0u64..4096, 0..300),
    ) {
        let mut cache = model(s, e, b);
        for address in addresses {
            let (set_index, _) = cache.decompose(address);
            let was_full = cache.set(set_index).iter().all(|line| line.valid);
            let outcome = cache.access(address);
            // Evictions happen exactly on misses to full sets
            prop_assert_eq!(outcome.kind == AccessKind::MissEviction, was_full && !outcome.kind.is_hit());
            for set in 0..cache.config().num_sets() {
                let valid: Vec<u64> = cache.set(set).iter().filter(|line| line.valid).map(|line| line.tag).collect();
                let unique: HashSet<u64> = valid.iter().copied().collect();
                prop_assert!(valid.len() <= e);
                prop_assert_eq!(unique.len(), valid.len());
            }
        }
    }

    #[test]
    fn accessed_line_is_most_recent(
        e in 1usize..6,
        addresses in prop::collection::vec(0u64..16, 1..100),
    ) {
        let mut cache = model(0, e, 0);
        for address in addresses {
            cache.access(address);
            let set = cache.set(0);
            let target = set.iter().filter(|line| line.valid && line.tag == address).collect::<Vec<_>>();
            prop_assert_eq!(target.len(), 1);
            prop_assert_eq!(target[0].recency, 0);
            prop_assert!(set.iter().filter(|line| line.valid).filter(|line| line.tag != address).all(|line| line.recency > 0));
        }
    }
}
