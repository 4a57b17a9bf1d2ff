//! A lock the back end and per-size-class middle end share: a real mutex
//! when multi-threaded, a no-op `RefCell` wrapper otherwise. The `mt-alloc`
//! feature picks which of the two this builds to; the default (feature
//! off) build has no synchronization primitive in the critical path at
//! all, matching the single-threaded, cooperative VM this crate ships for.

#[cfg(feature = "mt-alloc")]
mod imp {
    use std::sync::{Mutex, MutexGuard};

    pub struct Lock<T>(Mutex<T>);

    impl<T> Lock<T> {
        pub fn new(value: T) -> Self {
            Self(Mutex::new(value))
        }

        pub fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock().expect("threeimp_memory lock poisoned")
        }
    }
}

#[cfg(not(feature = "mt-alloc"))]
mod imp {
    use std::cell::{RefCell, RefMut};

    pub struct Lock<T>(RefCell<T>);

    impl<T> Lock<T> {
        pub fn new(value: T) -> Self {
            Self(RefCell::new(value))
        }

        pub fn lock(&self) -> RefMut<'_, T> {
            self.0.borrow_mut()
        }
    }
}

pub use imp::Lock;
