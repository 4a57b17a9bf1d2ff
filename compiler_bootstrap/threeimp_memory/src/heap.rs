//! Ties the back end, middle end and front end together into the single
//! allocation service the rest of the interpreter calls into.

use crate::central::CentralObjectAllocator;
use crate::front_end::ThreadCache;
use crate::page_heap::PageHeap;
use crate::size_class::{class_for_size, size_classes, SizeClass};
use std::cell::RefCell;
use std::mem::size_of;
use std::ptr::NonNull;
use threeimp_common::ThreeImpError;

/// Default arena size, chosen generously relative to the VM's default
/// stack capacity so a typical program's heap
/// traffic doesn't immediately exhaust the back end.
pub const DEFAULT_HEAP_PAGES: usize = 1 << 14; // 64 MiB

/// The segregated allocator: a page-heap back end, one
/// [`CentralObjectAllocator`] per size class, and a single [`ThreadCache`]
/// front end (the VM this crate serves is single-threaded).
pub struct Heap {
    page_heap: PageHeap,
    centrals: Vec<CentralObjectAllocator>,
    front: RefCell<ThreadCache>,
}

impl Heap {
    pub fn new(total_pages: usize) -> Self {
        let centrals = size_classes().map(CentralObjectAllocator::new).collect();
        Self { page_heap: PageHeap::new(total_pages), centrals, front: RefCell::new(ThreadCache::new()) }
    }

    fn central(&self, sci: usize) -> &CentralObjectAllocator {
        &self.centrals[sci - 1]
    }

    /// Allocate raw, zero-initialized storage sized to fit `T`, selecting
    /// a size class by `sizeof(T)`.
    pub fn alloc_raw(&self, class: SizeClass) -> Result<NonNull<u8>, ThreeImpError> {
        self.front
            .borrow_mut()
            .allocate(class.sci, self.central(class.sci), &self.page_heap)
            .ok_or_else(|| ThreeImpError::resource(format!("allocation failed for size class {}", class.sci)))
    }

    /// Allocate storage for one `T` and move `value` into it, returning an
    /// owning pointer. Callers are responsible for eventually calling
    /// [`Heap::dealloc`] or for letting the collector reclaim the object
    /// via [`crate::gc::sweep`].
    pub fn alloc<T>(&self, value: T) -> Result<NonNull<T>, ThreeImpError> {
        let class = class_for_size(size_of::<T>())
            .ok_or_else(|| ThreeImpError::resource("oversized allocation: no size class fits this object"))?;
        let raw = self.alloc_raw(class)?;
        let typed = raw.cast::<T>();
        // SAFETY: `raw` is a freshly carved, size-matching, unaliased slot.
        unsafe { typed.as_ptr().write(value) };
        Ok(typed)
    }

    /// Drop and release `ptr`, returning its slot to the front end.
    ///
    /// # Safety
    /// `ptr` must have been produced by [`Heap::alloc`] on this heap and
    /// not already deallocated.
    pub unsafe fn dealloc<T>(&self, ptr: NonNull<T>) {
        let class = class_for_size(size_of::<T>()).expect("dealloc of a type with no size class");
        std::ptr::drop_in_place(ptr.as_ptr());
        self.front.borrow_mut().deallocate(class.sci, ptr.cast::<u8>(), self.central(class.sci));
    }

    pub fn page_heap(&self) -> &PageHeap {
        &self.page_heap
    }

    pub fn central_for(&self, sci: usize) -> &CentralObjectAllocator {
        self.central(sci)
    }

    pub fn live_objects(&self, sci: usize) -> usize {
        self.central(sci).live_objects()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_round_trips_value() {
        let heap = Heap::new(64);
        let ptr = heap.alloc(42i64).unwrap();
        // SAFETY: ptr is live and uniquely owned by this test.
        unsafe { assert_eq!(*ptr.as_ref(), 42) };
        unsafe { heap.dealloc(ptr) };
    }

    #[test]
    fn repeated_alloc_dealloc_conserves_live_count() {
        let heap = Heap::new(64);
        let class = class_for_size(size_of::<i64>()).unwrap();
        let mut ptrs = Vec::new();
        for _ in 0..100 {
            ptrs.push(heap.alloc(7i64).unwrap());
        }
        assert_eq!(heap.live_objects(class.sci), 100);
        for p in ptrs {
            unsafe { heap.dealloc(p) };
        }
        assert_eq!(heap.live_objects(class.sci), 0);
    }
}
