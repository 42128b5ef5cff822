// Host-side tests for the free-list pool.

use bubble_core::*;

#[derive(Debug, Default, PartialEq)]
struct Scratch {
    value: u32,
    items: Vec<u32>,
}

fn scratch_pool(max_idle: usize) -> ObjectPool<Scratch> {
    ObjectPool::with_default(max_idle, |s: &mut Scratch| {
        s.value = 0;
        s.items.clear();
    })
}

#[test]
fn acquiring_past_cap_builds_fresh_instances() {
    let mut pool = scratch_pool(2);
    let held: Vec<Scratch> = (0..5).map(|_| pool.acquire()).collect();
    assert_eq!(held.len(), 5);
    for s in &held {
        assert_eq!(*s, Scratch::default());
    }
    let stats = pool.stats();
    assert_eq!(stats.created, 5);
    assert_eq!(stats.reused, 0);
    assert_eq!(pool.idle_len(), 0);
}

#[test]
fn releasing_past_cap_drops_excess() {
    let mut pool = scratch_pool(2);
    let held: Vec<Scratch> = (0..5).map(|_| pool.acquire()).collect();
    for s in held {
        pool.release(s);
    }
    assert_eq!(pool.idle_len(), 2);
    let stats = pool.stats();
    assert_eq!(stats.released, 5);
    assert_eq!(stats.discarded, 3);
    assert_eq!(stats.max_idle, 2);
}

#[test]
fn released_instances_come_back_reset() {
    let mut pool = scratch_pool(4);
    let mut s = pool.acquire();
    s.value = 99;
    s.items.extend([1, 2, 3]);
    pool.release(s);

    let again = pool.acquire();
    assert_eq!(again.value, 0);
    assert!(again.items.is_empty());
    // capacity survives the reset; that is the point of pooling
    assert!(again.items.capacity() >= 3);
    assert_eq!(pool.stats().reused, 1);
}

#[test]
fn prewarm_is_capped_and_clear_drops_everything() {
    let pool = scratch_pool(3).with_prewarm(10);
    assert_eq!(pool.idle_len(), 3);
    assert_eq!(pool.stats().created, 3);

    let mut pool = pool;
    pool.clear();
    assert_eq!(pool.idle_len(), 0);
    let fresh = pool.acquire();
    assert_eq!(fresh, Scratch::default());
}

#[test]
fn custom_constructor_is_used_for_fresh_instances() {
    let mut pool = ObjectPool::new(1, || vec![0u8; 16], |v: &mut Vec<u8>| v.fill(0));
    let mut a = pool.acquire();
    a[0] = 7;
    pool.release(a);
    let b = pool.acquire();
    assert_eq!(b.len(), 16);
    assert!(b.iter().all(|x| *x == 0));
    let c = pool.acquire();
    assert_eq!(c.len(), 16);
    assert_eq!(pool.stats().created, 2);
}
