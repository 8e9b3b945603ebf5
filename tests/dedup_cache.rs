use edgeline::{DedupCache, DedupConfig, DedupDecision, EventKey};
use std::sync::Arc;
use std::thread;

fn cache_with_ttl(seconds: u64) -> DedupCache {
    DedupCache::new(DedupConfig {
        ttl_seconds: seconds,
        max_entries: None,
    })
}

fn key(source: &str, sequence: u64) -> EventKey {
    EventKey {
        source_id: source.to_string(),
        sequence_id: sequence,
    }
}

#[test]
fn first_acceptance_is_fresh_then_duplicate() {
    let cache = cache_with_ttl(300);
    assert_eq!(
        cache.check_and_record(&key("device-001", 10), 1_000),
        DedupDecision::Fresh
    );
    assert_eq!(
        cache.check_and_record(&key("device-001", 10), 2_000),
        DedupDecision::Duplicate
    );
    // Same sequence from a different source is a different logical event.
    assert_eq!(
        cache.check_and_record(&key("device-002", 10), 2_000),
        DedupDecision::Fresh
    );
}

#[test]
fn expires_exactly_past_ttl() {
    let cache = cache_with_ttl(300);
    cache.check_and_record(&key("d", 1), 0);
    // Age equal to the TTL is still live.
    assert_eq!(
        cache.check_and_record(&key("d", 1), 300_000),
        DedupDecision::Duplicate
    );
    // One millisecond past the TTL, the key is logically absent again.
    assert_eq!(
        cache.check_and_record(&key("d", 1), 300_001),
        DedupDecision::Fresh
    );
}

#[test]
fn duplicates_do_not_extend_ttl() {
    let cache = cache_with_ttl(10);
    cache.check_and_record(&key("d", 5), 0);
    // A storm of duplicates at 9s must not push expiry out.
    for _ in 0..100 {
        assert_eq!(
            cache.check_and_record(&key("d", 5), 9_000),
            DedupDecision::Duplicate
        );
    }
    assert_eq!(
        cache.check_and_record(&key("d", 5), 10_500),
        DedupDecision::Fresh
    );
}

#[test]
fn expired_entries_are_reclaimed_not_accumulated() {
    let cache = cache_with_ttl(1);
    for seq in 0..200u64 {
        cache.check_and_record(&key("d", seq), seq);
    }
    assert_eq!(cache.occupancy(), 200);
    // Resubmitting the same keys past the TTL is a fresh acceptance per key;
    // the dead generation is swept rather than piling up alongside it.
    for seq in 0..200u64 {
        assert_eq!(
            cache.check_and_record(&key("d", seq), 100_000 + seq),
            DedupDecision::Fresh
        );
    }
    assert_eq!(cache.occupancy(), 200);
}

#[test]
fn capacity_cap_evicts_oldest_first() {
    let cache = DedupCache::new(DedupConfig {
        ttl_seconds: 3_600,
        max_entries: Some(64),
    });
    for seq in 0..1_024u64 {
        cache.check_and_record(&key("d", seq), seq);
    }
    // The cap is enforced per shard, so the bound is approximate but firm.
    assert!(cache.occupancy() <= 64);
    // The newest key survives eviction.
    assert_eq!(
        cache.check_and_record(&key("d", 1_023), 1_024),
        DedupDecision::Duplicate
    );
}

#[test]
fn concurrent_same_key_yields_exactly_one_fresh() {
    for round in 0..50u64 {
        let cache = Arc::new(cache_with_ttl(300));
        let contended = key("device-001", round);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            let contended = contended.clone();
            handles.push(thread::spawn(move || {
                cache.check_and_record(&contended, 1_000)
            }));
        }
        let fresh = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|decision| *decision == DedupDecision::Fresh)
            .count();
        assert_eq!(fresh, 1, "round {round}: exactly one caller observes Fresh");
    }
}

#[test]
fn unrelated_keys_do_not_interfere() {
    let cache = Arc::new(cache_with_ttl(300));
    let mut handles = Vec::new();
    for worker in 0..4u64 {
        let cache = cache.clone();
        handles.push(thread::spawn(move || {
            for seq in 0..100u64 {
                let decision =
                    cache.check_and_record(&key(&format!("device-{worker}"), seq), 1_000);
                assert_eq!(decision, DedupDecision::Fresh);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.occupancy(), 400);
}
