//! Front end: one sub-allocator per size class, each with
//! an object free-list. `allocate` pops from the free list, pulling a
//! transfer batch from the middle end when empty; `deallocate` pushes,
//! returning a batch to the middle end when the free list grows past
//! `num_to_move`.

use crate::central::CentralObjectAllocator;
use crate::page_heap::PageHeap;
use crate::size_class::{size_classes, SizeClass, NUM_SIZE_CLASSES};
use std::ptr::NonNull;

struct Cache {
    class: SizeClass,
    free_list: Vec<NonNull<u8>>,
}

/// A single thread's view of the front end: one of these per allocating
/// thread. The VM this crate backs is single-threaded, so
/// [`crate::heap::Heap`] owns exactly one.
pub struct ThreadCache {
    caches: Vec<Cache>,
}

impl ThreadCache {
    pub fn new() -> Self {
        let caches = size_classes().map(|class| Cache { class, free_list: Vec::new() }).collect();
        Self { caches }
    }

    fn slot(&mut self, sci: usize) -> &mut Cache {
        // sci 0 is the reserved oversized class and never reaches here;
        // size-class indices are otherwise 1-based and dense.
        &mut self.caches[sci - 1]
    }

    /// Pop one object of `sci`'s size, refilling from `central` if empty.
    pub fn allocate(
        &mut self,
        sci: usize,
        central: &CentralObjectAllocator,
        page_heap: &PageHeap,
    ) -> Option<NonNull<u8>> {
        if self.slot(sci).free_list.is_empty() {
            let batch = central.fetch(page_heap);
            if batch.is_empty() {
                return None;
            }
            self.slot(sci).free_list.extend(batch);
        }
        self.slot(sci).free_list.pop()
    }

    /// Push a freed object back, returning a batch to `central` once the
    /// free list exceeds `num_to_move`.
    pub fn deallocate(&mut self, sci: usize, ptr: NonNull<u8>, central: &CentralObjectAllocator) {
        let cache = self.slot(sci);
        cache.free_list.push(ptr);
        if cache.free_list.len() > cache.class.num_to_move {
            let drain_from = cache.free_list.len() - cache.class.num_to_move;
            let batch: Vec<NonNull<u8>> = cache.free_list.split_off(drain_from);
            central.release(&batch);
        }
    }
}

impl Default for ThreadCache {
    fn default() -> Self {
        Self::new()
    }
}

pub const NUM_FRONT_END_CLASSES: usize = NUM_SIZE_CLASSES - 1;
