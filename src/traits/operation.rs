use std::{any::Any, borrow::Cow, convert::Infallible};

/// Helper trait for downcasting operation trait objects to their concrete types.
///
/// Implemented for every `'static` type. Prefer the helpers on
/// `dyn Operation` (`is`, `downcast_ref`, `downcast`) over calling these
/// methods directly: on a `Box<dyn Operation<_, _>>` method resolution picks
/// the implementation for the `Box` itself.
pub trait AsAny: 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// An owned, type-erased operation as stored by the history.
pub type BoxedOperation<C, E = Infallible> = Box<dyn Operation<C, E>>;

/// Outcome of [`Operation::merge`].
pub enum Merge<C: 'static, E: 'static = Infallible> {
    /// The successor was absorbed. The receiver now undoes both effects as one step.
    Fused,
    /// The successor was not absorbed and is handed back untouched.
    Rejected(BoxedOperation<C, E>),
}

impl<C: 'static, E: 'static> Merge<C, E> {
    #[must_use]
    pub fn is_fused(&self) -> bool {
        matches!(self, Self::Fused)
    }
}

impl<C: 'static, E: 'static> std::fmt::Debug for Merge<C, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fused => write!(f, "Fused"),
            Self::Rejected(op) => write!(f, "Rejected({})", op.description()),
        }
    }
}

/// A reversible operation that can be executed, undone, and merged with its successor.
///
/// The operation acts on a context of type `C`, handed in by `&mut` on every call.
/// Operations that only touch state they closed over use `C = ()`.
/// `E` is the error an operation may fail with; it defaults to [`Infallible`].
///
/// # Required Methods
///
/// * `execute(&mut self, ctx: &mut C)`: Applies the forward effect.
/// * `undo(&mut self, ctx: &mut C)`: Reverses the most recent `execute`.
///
/// # Provided Methods
///
/// * `merge(&mut self, next)`: Tries to fuse `next` into `self`. The default never merges.
/// * `description(&self) -> Cow<str>`: A label for the operation. The default returns "Unknown operation".
///
/// # Example
///
/// ```
/// use operation_chain::prelude::*;
///
/// struct Add(i32);
///
/// impl Operation<i32> for Add {
///     fn execute(&mut self, ctx: &mut i32) -> Result<(), std::convert::Infallible> {
///         *ctx += self.0;
///         Ok(())
///     }
///
///     fn undo(&mut self, ctx: &mut i32) -> Result<(), std::convert::Infallible> {
///         *ctx -= self.0;
///         Ok(())
///     }
///
///     fn merge(&mut self, next: BoxedOperation<i32>) -> Merge<i32> {
///         match next.downcast::<Add>() {
///             Ok(next) => {
///                 self.0 += next.0;
///                 Merge::Fused
///             }
///             Err(next) => Merge::Rejected(next),
///         }
///     }
/// }
///
/// let mut value = 0;
/// let mut history: OperationHistory<i32> = OperationHistory::new();
/// history.record(Add(2), &mut value).unwrap();
/// history.record(Add(3), &mut value).unwrap();
/// assert_eq!(value, 5);
/// assert_eq!(history.stored_count(), 1);
///
/// history.undo(&mut value).unwrap();
/// assert_eq!(value, 0);
/// ```
pub trait Operation<C: 'static, E: 'static = Infallible>: AsAny {
    /// Applies the forward effect to `ctx`.
    ///
    /// Called once when the operation is recorded and once per redo.
    ///
    /// # Errors
    ///
    /// Returns the operation's own error. The history passes it through untouched.
    fn execute(&mut self, ctx: &mut C) -> Result<(), E>;

    /// Reverses the most recent [`execute`](Self::execute), including the
    /// effect of any successor fused in by [`merge`](Self::merge).
    ///
    /// # Errors
    ///
    /// Returns the operation's own error. The history passes it through untouched.
    fn undo(&mut self, ctx: &mut C) -> Result<(), E>;

    /// Tries to fuse `next`, which has already been executed, into `self`.
    ///
    /// On [`Merge::Fused`] a single `undo` of `self` must revert the combined
    /// effect of `self` followed by `next`. On [`Merge::Rejected`] `next` must be
    /// handed back and neither operation may have changed.
    fn merge(&mut self, next: BoxedOperation<C, E>) -> Merge<C, E> {
        Merge::Rejected(next)
    }

    fn description(&self) -> Cow<'_, str> {
        Cow::Borrowed("Unknown operation")
    }
}

impl<C: 'static, E: 'static> dyn Operation<C, E> {
    /// Returns `true` if the erased operation is a `T`.
    #[must_use]
    pub fn is<T: Operation<C, E>>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Operation<C, E>>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Operation<C, E>>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }

    /// Takes ownership of the concrete operation, or hands the box back
    /// unchanged if it holds another type.
    ///
    /// # Errors
    ///
    /// Returns the original box when the operation is not a `T`.
    pub fn downcast<T: Operation<C, E>>(self: Box<Self>) -> Result<Box<T>, Box<Self>> {
        if !self.is::<T>() {
            return Err(self);
        }

        AsAny::into_any(self)
            .downcast::<T>()
            .map_err(|_| unreachable!("operation type checked before downcast"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Add(i32);

    impl Operation<i32> for Add {
        fn execute(&mut self, ctx: &mut i32) -> Result<(), Infallible> {
            *ctx += self.0;
            Ok(())
        }

        fn undo(&mut self, ctx: &mut i32) -> Result<(), Infallible> {
            *ctx -= self.0;
            Ok(())
        }

        fn merge(&mut self, next: BoxedOperation<i32>) -> Merge<i32> {
            match next.downcast::<Self>() {
                Ok(next) => {
                    self.0 += next.0;
                    Merge::Fused
                }
                Err(next) => Merge::Rejected(next),
            }
        }

        fn description(&self) -> Cow<'_, str> {
            Cow::Owned(format!("Add({})", self.0))
        }
    }

    struct Reset {
        previous: i32,
    }

    impl Operation<i32> for Reset {
        fn execute(&mut self, ctx: &mut i32) -> Result<(), Infallible> {
            self.previous = std::mem::take(ctx);
            Ok(())
        }

        fn undo(&mut self, ctx: &mut i32) -> Result<(), Infallible> {
            *ctx = self.previous;
            Ok(())
        }
    }

    #[test]
    fn test_execute_then_undo_restores_context() {
        let mut value = 10;
        let mut op = Reset { previous: 0 };

        op.execute(&mut value).unwrap();
        assert_eq!(value, 0);

        op.undo(&mut value).unwrap();
        assert_eq!(value, 10);
    }

    #[test]
    fn test_default_description() {
        let op = Reset { previous: 0 };
        assert_eq!(op.description(), "Unknown operation");
        assert_eq!(Add(4).description(), "Add(4)");
    }

    #[test]
    fn test_default_merge_hands_successor_back() {
        let mut op = Reset { previous: 0 };
        let next: BoxedOperation<i32> = Box::new(Add(1));

        match op.merge(next) {
            Merge::Rejected(next) => assert_eq!(next.description(), "Add(1)"),
            Merge::Fused => panic!("Reset never merges"),
        }
    }

    #[test]
    fn test_merge_same_type() {
        let mut op = Add(2);
        let merge = op.merge(Box::new(Add(3)));

        assert!(merge.is_fused());
        assert_eq!(op.0, 5);
    }

    #[test]
    fn test_merge_rejects_other_type_without_side_effects() {
        let mut op = Add(2);
        let merge = op.merge(Box::new(Reset { previous: 7 }));

        assert!(!merge.is_fused());
        assert_eq!(op.0, 2);
        let Merge::Rejected(next) = merge else {
            unreachable!()
        };
        assert_eq!(next.downcast_ref::<Reset>().map(|r| r.previous), Some(7));
    }

    #[test]
    fn test_downcast_helpers() {
        let mut boxed: BoxedOperation<i32> = Box::new(Add(1));

        assert!(boxed.is::<Add>());
        assert!(!boxed.is::<Reset>());
        assert!(boxed.downcast_ref::<Reset>().is_none());

        if let Some(add) = boxed.downcast_mut::<Add>() {
            add.0 = 9;
        }

        let boxed = match boxed.downcast::<Reset>() {
            Ok(_) => panic!("Add is not a Reset"),
            Err(original) => original,
        };
        let add = boxed.downcast::<Add>().ok().unwrap();
        assert_eq!(add.0, 9);
    }

    #[test]
    fn test_operation_is_dyn_compatible() {
        let mut value = 0;
        let mut ops: Vec<BoxedOperation<i32>> =
            vec![Box::new(Add(3)), Box::new(Reset { previous: 0 })];

        for op in &mut ops {
            op.execute(&mut value).unwrap();
        }
        assert_eq!(value, 0);

        for op in ops.iter_mut().rev() {
            op.undo(&mut value).unwrap();
        }
        assert_eq!(value, 0);
    }
}
