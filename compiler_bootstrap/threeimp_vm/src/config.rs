//! `VmConfig`: the construction-time knobs this VM leaves open, collected
//! into one struct the way a build-system front end collects its own
//! flags, scaled down to what an embeddable VM needs.

/// Construction-time knobs for a [`crate::Vm`].
#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Value-stack capacity in slots, preallocated at construction time
    /// (default 4 Mi slots).
    pub stack_capacity: usize,
    /// Whether `Apply`/`Indirect`/arithmetic dynamic typechecks are
    /// compiled in. When disabled, the instructions trust the compiler's
    /// guarantees instead of re-checking them at run time.
    pub typecheck: bool,
    /// Pages handed to the backing [`threeimp_memory::Heap`].
    pub heap_pages: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_capacity: 4 << 20,
            typecheck: true,
            heap_pages: threeimp_memory::DEFAULT_HEAP_PAGES,
        }
    }
}
