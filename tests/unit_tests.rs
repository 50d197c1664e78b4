//! Allocator property tests run against the public `Heap` surface.

use syslab::alloc::Heap;

#[test]
fn alloc_release_returns_heap_to_original_wilderness_size() {
    let mut heap = Heap::init().unwrap();
    let original = heap.wilderness_size();
    let p = heap.allocate(24).unwrap();
    heap.release(p);
    assert_eq!(heap.wilderness_size(), original);
    assert_eq!(heap.free_block_count(), 0);
    heap.check().unwrap();
}

#[test]
fn two_allocations_released_in_either_order_coalesce_fully() {
    let mut heap = Heap::init().unwrap();
    let original = heap.wilderness_size();
    let a = heap.allocate(24).unwrap();
    let b = heap.allocate(24).unwrap();
    heap.release(b);
    heap.release(a);
    assert_eq!(heap.free_block_count(), 0);
    assert_eq!(heap.wilderness_size(), original);
    heap.check().unwrap();
}

#[test]
fn released_block_is_handed_back_out_on_next_matching_allocation() {
    let mut heap = Heap::init().unwrap();
    let a = heap.allocate(24).unwrap();
    let b = heap.allocate(24).unwrap();
    heap.release(a);
    let c = heap.allocate(24).unwrap();
    assert_eq!(a, c);
    heap.release(b);
    heap.release(c);
    heap.check().unwrap();
}

#[test]
fn large_freed_block_is_reused_across_multiple_wilderness_grows() {
    let mut heap = Heap::init().unwrap();
    let a = heap.allocate(3000).unwrap();
    let b = heap.allocate(3000).unwrap();
    let c = heap.allocate(3000).unwrap();
    heap.release(b);
    let d = heap.allocate(3000).unwrap();
    assert_eq!(b, d);
    heap.release(a);
    heap.release(c);
    heap.release(d);
    heap.check().unwrap();
}

#[test]
fn payloads_stay_eight_byte_aligned_across_a_size_spread() {
    let mut heap = Heap::init().unwrap();
    for n in [1u32, 7, 8, 9, 24, 63, 64, 100, 208, 3000, 20_000] {
        let p = heap.allocate(n).unwrap();
        assert_eq!(heap.payload_address(p) % 8, 0, "misaligned for n={n}");
    }
    heap.check().unwrap();
}

#[test]
fn usable_size_never_undershoots_the_request() {
    let mut heap = Heap::init().unwrap();
    for n in [1u32, 8, 24, 100, 3000] {
        let p = heap.allocate(n).unwrap();
        assert!(heap.usable_size(p) >= n);
        heap.release(p);
    }
}

#[test]
fn reallocate_grows_in_place_when_the_block_already_fits() {
    let mut heap = Heap::init().unwrap();
    let p = heap.allocate(64).unwrap();
    let q = heap.reallocate(Some(p), 32).unwrap();
    assert_eq!(p, q);
    heap.check().unwrap();
}

#[test]
fn zero_allocate_returns_zeroed_memory() {
    let mut heap = Heap::init().unwrap();
    let p = heap.zero_allocate(4, 8).unwrap();
    assert!(heap.payload(p)[..32].iter().all(|&b| b == 0));
}

#[test]
fn many_interleaved_allocations_and_releases_pass_validation() {
    let mut heap = Heap::init().unwrap();
    let mut live = Vec::new();
    for round in 0..200u32 {
        let size = 8 + (round * 37) % 4000;
        if let Some(h) = heap.allocate(size) {
            live.push(h);
        }
        if round % 3 == 0 {
            if let Some(h) = live.pop() {
                heap.release(h);
            }
        }
    }
    for h in live {
        heap.release(h);
    }
    heap.check().unwrap();
}
