//! Middle end: one `CentralObjectAllocator` per size class,
//! holding page-spans on loan from the back end with a per-span refcount
//! and an object free-list. Services the front end in fixed-count
//! "transfer" batches (`num_to_move`).

use crate::lock::Lock;
use crate::page_heap::{PageHeap, Span};
use crate::size_class::SizeClass;
use hashbrown::HashSet;
use log::debug;
use std::ptr::NonNull;

/// Bookkeeping for one page-span on loan to a size class.
struct SpanLoan {
    span: Span,
    /// Objects carved out of this span that are currently allocated (not on
    /// any free list). When this drops to zero the span can be returned to
    /// the back end.
    live_count: usize,
}

struct CentralState {
    class: SizeClass,
    spans: Vec<SpanLoan>,
    /// Addresses of free objects, ready to hand to the front end.
    free_list: Vec<NonNull<u8>>,
}

impl CentralState {
    fn span_index_for(&self, addr: usize, class_size: usize) -> Option<usize> {
        self.spans.iter().position(|loan| {
            let base = loan.span.start_page * crate::size_class::PAGE_SIZE;
            let extent = loan.span.num_pages * crate::size_class::PAGE_SIZE;
            addr >= base && addr < base + extent && (addr - base) % class_size == 0
        })
    }
}

/// The middle end for one size class.
pub struct CentralObjectAllocator {
    state: Lock<CentralState>,
}

impl CentralObjectAllocator {
    pub fn new(class: SizeClass) -> Self {
        Self { state: Lock::new(CentralState { class, spans: Vec::new(), free_list: Vec::new() }) }
    }

    /// Carve a freshly-borrowed span from `page_heap` into free-list
    /// entries of this size class.
    fn grow(&self, page_heap: &PageHeap, state: &mut CentralState) -> bool {
        let Some(span) = page_heap.allocate_span(state.class.pages_per_span) else {
            return false;
        };
        let base = page_heap.span_ptr(span);
        let count = state.class.objects_per_span();
        for i in 0..count {
            // SAFETY: `i * object_size` stays within the span's byte extent
            // because `objects_per_span` floors that division.
            let obj = unsafe { NonNull::new_unchecked(base.as_ptr().add(i * state.class.object_size)) };
            state.free_list.push(obj);
        }
        state.spans.push(SpanLoan { span, live_count: 0 });
        debug!(
            "central[{}]: borrowed span of {} pages, {count} objects",
            state.class.sci, state.class.pages_per_span
        );
        true
    }

    /// Fetch up to `state.class.num_to_move` objects for the front end,
    /// growing from the back end if the free list is empty. Returns fewer
    /// than requested only if the back end itself is exhausted.
    pub fn fetch(&self, page_heap: &PageHeap) -> Vec<NonNull<u8>> {
        let mut state = self.state.lock();
        let want = state.class.num_to_move;
        if state.free_list.len() < want && !self.grow(page_heap, &mut state) {
            // Back end exhausted; hand back whatever is left.
        }
        let take = want.min(state.free_list.len());
        let batch: Vec<NonNull<u8>> = state.free_list.split_off(state.free_list.len() - take);
        for &obj in &batch {
            let class_size = state.class.object_size;
            if let Some(idx) = state.span_index_for(obj.as_ptr() as usize, class_size) {
                state.spans[idx].live_count += 1;
            }
        }
        batch
    }

    /// Return a batch of objects (previously fetched from this allocator)
    /// to the free list.
    pub fn release(&self, objs: &[NonNull<u8>]) {
        let mut state = self.state.lock();
        let class_size = state.class.object_size;
        for &obj in objs {
            if let Some(idx) = state.span_index_for(obj.as_ptr() as usize, class_size) {
                state.spans[idx].live_count = state.spans[idx].live_count.saturating_sub(1);
            }
            state.free_list.push(obj);
        }
    }

    /// Replace the free list wholesale with `marked`, the set of addresses
    /// the collector determined are reachable, then batch-return any span
    /// whose objects are entirely accounted for among `marked` plus
    /// genuinely-free slots. This is the per-class step of
    /// [`crate::gc::sweep`].
    pub fn sweep(&self, page_heap: &PageHeap, marked: &HashSet<usize>) {
        let mut state = self.state.lock();
        let class_size = state.class.object_size;

        // All object addresses ever carved from a loaned span.
        let mut all_addrs = Vec::new();
        for loan in &state.spans {
            let base = loan.span.start_page * crate::size_class::PAGE_SIZE;
            let count = state.class.objects_per_span();
            for i in 0..count {
                all_addrs.push(base + i * class_size);
            }
        }

        state.free_list.clear();
        // Re-admit the marked (live) objects first, without coalescing --
        // they are not placed on the recyclable free list.
        let mut reachable = HashSet::with_capacity(marked.len());
        for &addr in marked {
            reachable.insert(addr);
        }

        for &addr in &all_addrs {
            let live_here = reachable.contains(&addr);
            if !live_here {
                // SAFETY: addr was computed from a span this allocator owns.
                let ptr = unsafe { NonNull::new_unchecked(addr as *mut u8) };
                state.free_list.push(ptr);
            }
        }
        for loan in state.spans.iter_mut() {
            let base = loan.span.start_page * crate::size_class::PAGE_SIZE;
            let extent = loan.span.num_pages * crate::size_class::PAGE_SIZE;
            loan.live_count = reachable.iter().filter(|&&a| a >= base && a < base + extent).count();
        }
        debug!(
            "central[{}]: swept, {} objects reclaimed, {} still live",
            state.class.sci,
            state.free_list.len(),
            reachable.len()
        );
        drop(state);
        self.trim_unused_pages(page_heap);
    }

    /// Return any span whose `live_count` has reached zero back to the
    /// back end.
    pub fn trim_unused_pages(&self, page_heap: &PageHeap) {
        let mut state = self.state.lock();
        let class_size = state.class.object_size;
        let mut kept = Vec::with_capacity(state.spans.len());
        let mut returned_any = false;
        let spans = std::mem::take(&mut state.spans);
        for loan in spans {
            if loan.live_count == 0 {
                let base = loan.span.start_page * crate::size_class::PAGE_SIZE;
                let extent = loan.span.num_pages * crate::size_class::PAGE_SIZE;
                state.free_list.retain(|ptr| {
                    let addr = ptr.as_ptr() as usize;
                    !(addr >= base && addr < base + extent)
                });
                page_heap.deallocate_span(loan.span);
                returned_any = true;
            } else {
                kept.push(loan);
            }
        }
        state.spans = kept;
        if returned_any {
            debug!("central[{}]: trimmed unused spans", class_size);
        }
    }

    pub fn live_objects(&self) -> usize {
        let state = self.state.lock();
        state.spans.iter().map(|s| s.live_count).sum()
    }
}
