//! Segregated size-class allocator and mark-sweep garbage collector
//! (component C3) backing the threeimp Scheme interpreter's heap.
//!
//! Three tiers, leaves first:
//! - [`page_heap`] -- the back end: one contiguous arena of aligned pages.
//! - [`central`] -- the middle end: one [`central::CentralObjectAllocator`]
//!   per size class, each holding page-spans on loan from the back end.
//! - [`front_end`] -- the front end: a per-"thread" free list per size
//!   class (the VM this crate serves has exactly one thread).
//!
//! [`heap::Heap`] composes all three into the single entry point the rest
//! of the interpreter allocates through. [`gc::sweep`] implements the
//! sweep half of mark-and-sweep against an externally supplied
//! [`gc::MarkedSet`].

pub mod central;
pub mod front_end;
pub mod gc;
pub mod heap;
pub mod lock;
pub mod page_heap;
pub mod size_class;

pub use central::CentralObjectAllocator;
pub use front_end::ThreadCache;
pub use gc::{sweep, MarkedSet};
pub use heap::{Heap, DEFAULT_HEAP_PAGES};
pub use page_heap::{PageHeap, Span};
pub use size_class::{class_for_size, size_class, size_classes, SizeClass, NUM_SIZE_CLASSES, OVERSIZED_SCI};
