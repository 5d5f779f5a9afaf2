use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A cloneable handle to state that operations close over.
///
/// Operations recorded with a unit context (`C = ()`) keep a clone of the
/// handle and mutate the state through it, while the owner keeps another clone
/// to observe the result. Every clone points at the same value.
///
/// # Examples
///
/// ```
/// use operation_chain::shared_state::SharedState;
///
/// let text = SharedState::new(String::from("abc"));
/// let handle = text.clone();
/// handle.with(|s| s.push('d'));
/// assert_eq!(text.get(), "abcd");
/// ```
pub struct SharedState<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> SharedState<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Locks the state. Blocks while another guard is alive.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }

    /// Runs `f` with exclusive access to the state and returns its result.
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut value = self.lock();
        f(&mut value)
    }

    /// Replaces the state, returning the previous value.
    pub fn replace(&self, value: T) -> T {
        std::mem::replace(&mut *self.lock(), value)
    }

    /// Returns `true` if both handles point at the same state.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SharedState<T> {
    /// Returns a copy of the current state.
    #[must_use]
    pub fn get(&self) -> T {
        self.lock().clone()
    }
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SharedState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for SharedState<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_lock() {
            Some(value) => write!(f, "SharedState({:?})", *value),
            None => write!(f, "SharedState(<locked>)"),
        }
    }
}
