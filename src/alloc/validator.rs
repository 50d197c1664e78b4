//! Heap validator.
//!
//! Walks the heap two ways — block by block, and bin list by bin list —
//! and cross-checks every structural invariant. Validation is purely
//! diagnostic: it never affects the allocator's public contract, so
//! callers opt in explicitly via [`super::Heap::check`]. `Heap` also
//! runs this between every public operation under `debug_assertions`,
//! the equivalent of a C allocator's `NDEBUG` toggle.

use super::bins::Bins;
use super::block;
use super::error::ValidationError;
use std::collections::HashSet;

fn fail(msg: impl Into<String>) -> ValidationError {
    ValidationError(msg.into())
}

/// Run every invariant check. `heap_lo` is the offset of the first real
/// block (past the prologue pad); `heap_len` is the total backing-buffer
/// size; `wilderness_head` is the header offset of the wilderness block.
pub fn check(
    buf: &[u8],
    bins: &Bins,
    heap_lo: u32,
    wilderness_head: u32,
    heap_len: u32,
) -> Result<(), ValidationError> {
    let mut free_by_traversal = 0usize;
    let mut free_offsets = HashSet::new();

    // Walk blocks low to high, confirming size/footer/alignment and that
    // no two adjacent non-wilderness blocks are both free.
    let mut offset = heap_lo;
    let mut prev_was_free = false;
    while offset < heap_len {
        let (size, allocated) = block::header(buf, offset);
        if size < block::MIN_BLOCK {
            return Err(fail(format!("block at {offset} smaller than MIN_BLOCK")));
        }
        if size % 8 != 0 {
            return Err(fail(format!("block at {offset} has size not a multiple of 8")));
        }
        if offset + size > heap_len {
            return Err(fail(format!("block at {offset} runs past end of heap")));
        }
        let footer_size = block::footer_size(buf, offset, size);
        if footer_size != size {
            return Err(fail(format!(
                "block at {offset}: header size {size} != footer size {footer_size}"
            )));
        }

        let is_wilderness = offset == wilderness_head;
        if is_wilderness && allocated {
            return Err(fail("wilderness block is marked allocated"));
        }
        if !allocated {
            free_by_traversal += 1;
            free_offsets.insert(offset);
            if prev_was_free && !is_wilderness {
                return Err(fail(format!(
                    "two adjacent free blocks uncoalesced at {offset}"
                )));
            }
        }
        prev_was_free = !allocated;
        offset += size;
    }
    if offset != heap_len {
        return Err(fail("block walk did not land exactly on heap end"));
    }
    if wilderness_head >= heap_len {
        return Err(fail("wilderness_head is not inside the heap"));
    }

    // The wilderness is free-by-traversal but never bin-resident by
    // design; drop it from the set before cross-checking bin membership.
    if !free_offsets.remove(&wilderness_head) {
        return Err(fail("wilderness block not found free during traversal"));
    }

    // Walk every bin list, confirming membership, doubly-linked integrity
    // and that each block belongs to the bin it's filed under.
    let mut free_by_lists = 0usize;
    for bin in bins.all_bins() {
        let mut prev: Option<u32> = None;
        for current in bins.iter(buf, bin) {
            if current == wilderness_head {
                return Err(fail("wilderness block found inside a bin list"));
            }
            let (size, allocated) = block::header(buf, current);
            if allocated {
                return Err(fail(format!("allocated block {current} found in bin {bin}")));
            }
            if !free_offsets.remove(&current) {
                return Err(fail(format!(
                    "block {current} listed in bin {bin} twice or not a real free block"
                )));
            }
            let expected_bin = super::bins::bin_index(size);
            if expected_bin != bin {
                return Err(fail(format!(
                    "block {current} of size {size} filed under bin {bin}, expected {expected_bin}"
                )));
            }
            if block::back_link(buf, current) != prev {
                return Err(fail(format!("block {current} back-link does not point to predecessor")));
            }
            prev = Some(current);
            free_by_lists += 1;
        }
    }

    if !free_offsets.is_empty() {
        return Err(fail(format!(
            "{} free block(s) reachable by traversal but absent from every bin",
            free_offsets.len()
        )));
    }
    // the wilderness itself is free-by-traversal but never bin-resident
    if free_by_traversal != free_by_lists + 1 {
        return Err(fail(format!(
            "free block count mismatch: {free_by_traversal} by traversal, {free_by_lists} by bin lists (+1 wilderness)"
        )));
    }

    Ok(())
}
