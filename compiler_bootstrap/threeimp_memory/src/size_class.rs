//! Fixed size-class table shared by the back, middle and front ends.
//!
//! Size classes are a fixed table mapping `sci -> (object size,
//! pages-per-span, num-to-move)`; `sci=0` is reserved for oversized
//! allocations (not implemented in core). The table below follows the
//! tcmalloc-style doubling-then-linear progression the rest of the corpus
//! uses for segregated allocators: small classes grow by a fixed stride,
//! larger ones double.

pub const PAGE_SIZE: usize = 4096;

/// One row of the size-class table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    /// Index into the table. `0` is the reserved oversized class.
    pub sci: usize,
    /// Size in bytes of one object in this class.
    pub object_size: usize,
    /// Number of pages fetched from the back end per span.
    pub pages_per_span: usize,
    /// Batch size used when the front end refills from (or returns to) the
    /// middle end.
    pub num_to_move: usize,
}

impl SizeClass {
    pub const fn objects_per_span(&self) -> usize {
        (self.pages_per_span * PAGE_SIZE) / self.object_size
    }
}

/// The reserved oversized-allocation class, not implemented in core --
/// attempting to size an object into it is a
/// [`threeimp_common::ThreeImpError::Resource`] at the call site.
pub const OVERSIZED_SCI: usize = 0;

const TABLE: &[SizeClass] = &[
    SizeClass { sci: 0, object_size: 0, pages_per_span: 0, num_to_move: 0 }, // oversized, unimplemented
    SizeClass { sci: 1, object_size: 16, pages_per_span: 1, num_to_move: 32 },
    SizeClass { sci: 2, object_size: 32, pages_per_span: 1, num_to_move: 32 },
    SizeClass { sci: 3, object_size: 48, pages_per_span: 1, num_to_move: 32 },
    SizeClass { sci: 4, object_size: 64, pages_per_span: 1, num_to_move: 32 },
    SizeClass { sci: 5, object_size: 96, pages_per_span: 1, num_to_move: 16 },
    SizeClass { sci: 6, object_size: 128, pages_per_span: 1, num_to_move: 16 },
    SizeClass { sci: 7, object_size: 192, pages_per_span: 2, num_to_move: 16 },
    SizeClass { sci: 8, object_size: 256, pages_per_span: 2, num_to_move: 8 },
    SizeClass { sci: 9, object_size: 384, pages_per_span: 2, num_to_move: 8 },
    SizeClass { sci: 10, object_size: 512, pages_per_span: 4, num_to_move: 8 },
    SizeClass { sci: 11, object_size: 1024, pages_per_span: 4, num_to_move: 4 },
];

pub const NUM_SIZE_CLASSES: usize = TABLE.len();

/// Look up a size class by index.
pub fn size_class(sci: usize) -> SizeClass {
    TABLE[sci]
}

/// All non-oversized size classes, in ascending order.
pub fn size_classes() -> impl Iterator<Item = SizeClass> {
    TABLE.iter().skip(1).copied()
}

/// Choose the smallest size class whose `object_size` fits `bytes`, or
/// `None` if `bytes` exceeds the largest class (the allocation site must
/// then go through the unimplemented oversized path and fail).
pub fn class_for_size(bytes: usize) -> Option<SizeClass> {
    TABLE.iter().skip(1).find(|c| c.object_size >= bytes).copied()
}
