//! Core A — segregated-fit heap allocator.
//!
//! A drop-in replacement for the standard allocate/release/reallocate/
//! zero-allocate quartet, built on a single owned byte buffer instead of a raw
//! `sbrk`-backed heap. [`Heap`] is the allocator context: it owns every
//! piece of process-wide state a C allocator would keep in globals
//! (`heap_base`, `wilderness_head`), and every public operation is a
//! method on it.
//!
//! Pointers become [`BlockHandle`]s — opaque word offsets into the
//! backing buffer — so every operation here is safe Rust; the payload
//! accessors (`payload`, `payload_mut`) are the only place a caller
//! touches raw bytes, and they do so through ordinary slice indexing.

mod bins;
mod block;
mod error;
mod placement;
mod validator;
mod wilderness;

pub use error::{HeapError, ValidationError};

/// Opaque handle to an allocated block, the safe-Rust stand-in for a raw
/// payload pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHandle(u32);

/// A segregated-fit heap.
///
/// The very first block starts 4 bytes into the backing buffer rather
/// than at index 0. This mirrors the reference's own prologue-padding
/// trick (CS:APP's `mm.c` inserts a padding word for the same reason):
/// since every block header is one word and every block size is a
/// multiple of 8, starting the first block at an offset congruent to 4
/// (mod 8) makes every payload — `block_start + 4` — land on an offset
/// congruent to 0 (mod 8). Combined with the fact that `System`-class
/// allocators hand out memory aligned well past 8 bytes for any
/// non-trivial `Vec<u8>` allocation, every payload handed back by
/// [`Heap::allocate`] is 8-byte aligned in the process's real address
/// space, not just in this crate's own offset arithmetic.
const PAD: u32 = block::WORD;

pub struct Heap {
    buf: Vec<u8>,
    bins: bins::Bins,
    wilderness_head: u32,
}

impl Heap {
    /// Call before any other operation.
    pub fn init() -> Result<Self, HeapError> {
        let mut heap = Heap {
            buf: vec![0u8; PAD as usize],
            bins: bins::Bins::new(),
            wilderness_head: PAD,
        };
        heap.extend_heap(wilderness::CHUNKSIZE)?;
        let size = heap.buf.len() as u32 - PAD;
        block::set_header_footer(&mut heap.buf, PAD, size, false);
        Ok(heap)
    }

    fn heap_lo(&self) -> u32 {
        PAD
    }

    fn heap_hi(&self) -> u32 {
        self.buf.len() as u32
    }

    fn extend_heap(&mut self, bytes: u32) -> Result<(), HeapError> {
        let new_len = self.buf.len() as u64 + bytes as u64;
        if new_len > u32::MAX as u64 {
            return Err(HeapError::OutOfMemory);
        }
        self.buf.resize(new_len as usize, 0);
        Ok(())
    }

    /// Allocate `n` user bytes. Returns `None` for `n == 0`
    /// or when growing the heap fails.
    pub fn allocate(&mut self, n: u32) -> Option<BlockHandle> {
        if n == 0 {
            return None;
        }
        let padded = block::padded_size(n);
        let start_bin = bins::bin_index(padded);

        for bin in start_bin..=bins::OVERFLOW_BIN {
            let found = if bin < bins::S {
                self.bins.head(bin)
            } else {
                self.bins
                    .iter(&self.buf, bin)
                    .take(6)
                    .filter(|&off| block::header(&self.buf, off).0 >= padded)
                    .min_by_key(|&off| block::header(&self.buf, off).0)
            };

            if let Some(off) = found {
                let (size, _) = block::header(&self.buf, off);
                self.bins.remove(&mut self.buf, off, bin);
                let placed = placement::place(&mut self.buf, &mut self.bins, off, size, padded);
                self.debug_check();
                return Some(BlockHandle(placed));
            }
        }

        self.allocate_from_wilderness(padded)
    }

    fn allocate_from_wilderness(&mut self, request: u32) -> Option<BlockHandle> {
        let wilderness_size = self.heap_hi() - self.wilderness_head;
        if wilderness_size < request + block::MIN_BLOCK {
            let grow = wilderness::grow_amount(wilderness_size, request);
            self.extend_heap(grow).ok()?;
        }
        let wilderness_size = self.heap_hi() - self.wilderness_head;
        let old_head = self.wilderness_head;
        let (new_head, new_size) = wilderness::carve(old_head, wilderness_size, request);

        block::set_header_footer(&mut self.buf, old_head, request, true);
        block::set_header_footer(&mut self.buf, new_head, new_size, false);
        self.wilderness_head = new_head;

        self.debug_check();
        Some(BlockHandle(old_head))
    }

    /// Release a previously allocated block. Idempotent on `None` the
    /// way a C allocator is idempotent on a nil pointer — call sites wrap
    /// a `BlockHandle` in `Option` for that reason.
    pub fn release(&mut self, handle: BlockHandle) {
        let (mut size, _) = block::header(&self.buf, handle.0);
        let mut offset = handle.0;
        block::set_header(&mut self.buf, offset, size, false);

        if let Some(prev_size) = self.prev_footer_size(offset) {
            let prev_offset = offset - prev_size;
            let (_, prev_allocated) = block::header(&self.buf, prev_offset);
            if !prev_allocated {
                let prev_bin = bins::bin_index(prev_size);
                self.bins.remove(&mut self.buf, prev_offset, prev_bin);
                size += prev_size;
                offset = prev_offset;
            }
        }

        let next_offset = offset + size;
        if next_offset == self.wilderness_head {
            let wilderness_size = self.heap_hi() - next_offset;
            block::set_header_footer(&mut self.buf, offset, size + wilderness_size, false);
            self.wilderness_head = offset;
        } else {
            if next_offset < self.heap_hi() {
                let (next_size, next_allocated) = block::header(&self.buf, next_offset);
                if !next_allocated {
                    let next_bin = bins::bin_index(next_size);
                    self.bins.remove(&mut self.buf, next_offset, next_bin);
                    size += next_size;
                }
            }
            block::set_header_footer(&mut self.buf, offset, size, false);
            self.bins.insert(&mut self.buf, offset, size);
        }

        self.debug_check();
    }

    fn prev_footer_size(&self, offset: u32) -> Option<u32> {
        if offset <= self.heap_lo() {
            return None;
        }
        Some(block::footer_size_at(&self.buf, offset - block::WORD))
    }

    /// `realloc(None, n) == allocate(n)`; `realloc(Some(p), 0)` frees `p`
    /// and returns `None`.
    pub fn reallocate(&mut self, handle: Option<BlockHandle>, n: u32) -> Option<BlockHandle> {
        let handle = match handle {
            None => return self.allocate(n),
            Some(h) => h,
        };
        if n == 0 {
            self.release(handle);
            return None;
        }

        let (old_size, _) = block::header(&self.buf, handle.0);
        let padded = block::padded_size(n);
        if old_size >= padded {
            return Some(handle);
        }

        let new_handle = self.allocate(n)?;
        let old_range = block::payload_range(handle.0, old_size);
        let (new_size, _) = block::header(&self.buf, new_handle.0);
        let new_range = block::payload_range(new_handle.0, new_size);
        let copy_len = old_range.len().min(new_range.len()).min(n as usize);

        let old_bytes = self.buf[old_range.start..old_range.start + copy_len].to_vec();
        self.buf[new_range.start..new_range.start + copy_len].copy_from_slice(&old_bytes);

        self.release(handle);
        Some(new_handle)
    }

    /// `allocate(count * size)` followed by zeroing.
    pub fn zero_allocate(&mut self, count: u32, size: u32) -> Option<BlockHandle> {
        let total = (count as u64).checked_mul(size as u64)?;
        if total > u32::MAX as u64 {
            return None;
        }
        let handle = self.allocate(total as u32)?;
        let (block_size, _) = block::header(&self.buf, handle.0);
        let range = block::payload_range(handle.0, block_size);
        self.buf[range].fill(0);
        Some(handle)
    }

    /// Read-only view of a block's payload.
    pub fn payload(&self, handle: BlockHandle) -> &[u8] {
        let (size, _) = block::header(&self.buf, handle.0);
        &self.buf[block::payload_range(handle.0, size)]
    }

    /// Mutable view of a block's payload.
    pub fn payload_mut(&mut self, handle: BlockHandle) -> &mut [u8] {
        let (size, _) = block::header(&self.buf, handle.0);
        &mut self.buf[block::payload_range(handle.0, size)]
    }

    /// Number of usable payload bytes behind `handle` — always `>= n` for
    /// whatever `n` produced this handle.
    pub fn usable_size(&self, handle: BlockHandle) -> u32 {
        let (size, _) = block::header(&self.buf, handle.0);
        size - block::OVERHEAD
    }

    /// Absolute byte address of a handle's payload, for alignment checks.
    pub fn payload_address(&self, handle: BlockHandle) -> usize {
        self.buf.as_ptr() as usize + handle.0 as usize + block::WORD as usize
    }

    /// Number of free, non-wilderness blocks (for coalescing tests).
    pub fn free_block_count(&self) -> usize {
        let mut offset = self.heap_lo();
        let mut count = 0;
        while offset < self.heap_hi() {
            let (size, allocated) = block::header(&self.buf, offset);
            if !allocated && offset != self.wilderness_head {
                count += 1;
            }
            offset += size;
        }
        count
    }

    /// Size of the wilderness block.
    pub fn wilderness_size(&self) -> u32 {
        self.heap_hi() - self.wilderness_head
    }

    /// Run the heap validator. Diagnostic only — never
    /// called automatically outside `debug_assertions` builds.
    pub fn check(&self) -> Result<(), ValidationError> {
        validator::check(
            &self.buf,
            &self.bins,
            self.heap_lo(),
            self.wilderness_head,
            self.heap_hi(),
        )
    }

    #[cfg(debug_assertions)]
    fn debug_check(&self) {
        if let Err(e) = self.check() {
            panic!("{e}");
        }
    }

    #[cfg(not(debug_assertions))]
    fn debug_check(&self) {}
}
