//! Mark-and-sweep sweep phase.
//!
//! Marking itself -- root enumeration and the reachability walk -- is a
//! collaborator interface: [`MarkedSet`] is handed to [`sweep`] fully
//! formed. This crate does not implement a complete mark phase; the
//! mark/sweep cycle is only ever invoked at explicit safe points by a
//! caller that already knows what is reachable.

use crate::heap::Heap;
use crate::size_class::size_classes;
use hashbrown::HashMap;
use log::debug;
use std::ptr::NonNull;

/// The set of pointers a (hypothetical, external) mark phase has determined
/// are reachable, grouped by size class.
#[derive(Debug, Default, Clone)]
pub struct MarkedSet {
    by_class: HashMap<usize, Vec<usize>>,
}

impl MarkedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `ptr`, of size class `sci`, as reachable.
    pub fn mark(&mut self, sci: usize, ptr: NonNull<u8>) {
        self.by_class.entry(sci).or_default().push(ptr.as_ptr() as usize);
    }

    fn addrs_for(&self, sci: usize) -> hashbrown::HashSet<usize> {
        self.by_class.get(&sci).into_iter().flatten().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run the sweep phase over every size class: clear each central
/// allocator's free list, re-admit the marked pointers as live, batch
/// return everything else to the middle end, then trim fully-unused spans
/// back to the back end.
pub fn sweep(heap: &Heap, marked: &MarkedSet) {
    debug!("gc: sweep starting, {} marked objects", marked.len());
    for class in size_classes() {
        let addrs = marked.addrs_for(class.sci);
        heap.central_for(class.sci).sweep(heap.page_heap(), &addrs);
    }
    debug!("gc: sweep complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::size_class::class_for_size;
    use std::mem::size_of;

    #[test]
    fn unmarked_objects_are_reclaimed() {
        let heap = Heap::new(64);
        let class = class_for_size(size_of::<i64>()).unwrap();
        let kept = heap.alloc(1i64).unwrap();
        let _garbage = heap.alloc(2i64).unwrap();

        let mut marked = MarkedSet::new();
        marked.mark(class.sci, kept.cast::<u8>());

        sweep(&heap, &marked);

        // The kept object is still readable; the garbage slot was returned
        // to the middle end's free list (observable as a drop in live count
        // back to just the marked object).
        assert_eq!(heap.live_objects(class.sci), 1);
        unsafe { assert_eq!(*kept.as_ref(), 1) };
    }

    #[test]
    fn sweep_with_nothing_marked_reclaims_everything() {
        let heap = Heap::new(64);
        let class = class_for_size(size_of::<i64>()).unwrap();
        let _a = heap.alloc(1i64).unwrap();
        let _b = heap.alloc(2i64).unwrap();

        sweep(&heap, &MarkedSet::new());

        assert_eq!(heap.live_objects(class.sci), 0);
    }
}
