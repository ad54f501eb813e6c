//! The stub-and-count wrapper.
//!
//! [`Mock`] sits in front of any [`Respond`] target. A call first consults the
//! mock's stub table and only falls through to the target when no stub is
//! registered under that name, so the target keeps every capability it had.

use std::collections::HashMap;
use std::fmt::{self, Debug};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::dispatch::{Respond, Value};
use crate::error::{Error, Result};

/// Per-wrapper bookkeeping: stubbed return values and watch counters.
#[derive(Debug, Default)]
struct MockState {
    stubs: HashMap<String, Value>,
    watch_counts: HashMap<String, usize>,
}

impl MockState {
    /// Bump the counter for `method` if it is watched.
    fn count(&mut self, method: &str) {
        if let Some(count) = self.watch_counts.get_mut(method) {
            *count += 1;
        }
    }
}

/// A test double wrapping a target object.
///
/// Created blank with [`Mock::new`] or around an existing object with
/// [`Mock::wrap`]. Either way the mock answers [`expects`](Mock::expects),
/// [`watch`](Mock::watch) and [`called_times`](Mock::called_times).
///
/// Configuration and calls take `&self`, so the mock can be handed to the code
/// under test by shared reference while the test keeps observing it.
///
/// # Example
///
/// ```rust
/// use testkit_doubles::{Mock, json};
///
/// let mock = Mock::new();
/// mock.expects("imitated_method", true).watch("imitated_method");
///
/// assert_eq!(mock.call("imitated_method", &[]).unwrap(), json!(true));
/// assert_eq!(mock.call("imitated_method", &[]).unwrap(), json!(true));
/// assert_eq!(mock.called_times("imitated_method"), Some(2));
/// ```
pub struct Mock<T = ()> {
    target: Mutex<T>,
    state: Mutex<MockState>,
}

impl Mock<()> {
    /// Create a mock around a blank object that has no methods of its own.
    #[must_use]
    pub fn new() -> Self {
        Self::wrap(())
    }
}

impl Default for Mock<()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mock<T> {
    /// Wrap `target`, keeping all of its native methods callable.
    ///
    /// # Example
    ///
    /// ```rust
    /// use testkit_doubles::{Mock, Model, ModelClass, json};
    ///
    /// let class = ModelClass::builder("Person").field("name").build();
    /// let person = Model::new(&class, json!({"name": "Ann"})).unwrap();
    ///
    /// let mock = Mock::wrap(person);
    /// assert_eq!(mock.call("name", &[]).unwrap(), json!("Ann"));
    /// ```
    pub fn wrap(target: T) -> Self {
        Self {
            target: Mutex::new(target),
            state: Mutex::new(MockState::default()),
        }
    }

    /// Make every later call to `method` return `value`, whatever the arguments.
    ///
    /// Registering the same name again replaces the value but keeps its
    /// watch counter. A stub shadows a native method of the same name.
    pub fn expects(&self, method: impl Into<String>, value: impl Into<Value>) -> &Self {
        let method = method.into();
        let value = value.into();
        debug!(method = %method, value = %value, "registering stub");
        self.state.lock().stubs.insert(method, value);
        self
    }

    /// Start counting calls to `method`.
    ///
    /// The counter starts at zero; watching an already watched name leaves its
    /// count alone.
    pub fn watch(&self, method: impl Into<String>) -> &Self {
        let method = method.into();
        let mut state = self.state.lock();
        if !state.watch_counts.contains_key(&method) {
            debug!(method = %method, "watching method");
            state.watch_counts.insert(method, 0);
        }
        self
    }

    /// Number of dispatched calls to `method` since it was watched.
    ///
    /// Returns `None` if `method` was never watched, even if it is stubbed
    /// and has been called.
    #[must_use]
    pub fn called_times(&self, method: &str) -> Option<usize> {
        self.state.lock().watch_counts.get(method).copied()
    }

    /// Check if `method` has a registered stub.
    #[must_use]
    pub fn is_stubbed(&self, method: &str) -> bool {
        self.state.lock().stubs.contains_key(method)
    }

    /// Check if `method` is being watched.
    #[must_use]
    pub fn is_watched(&self, method: &str) -> bool {
        self.state.lock().watch_counts.contains_key(method)
    }

    /// The value currently stubbed for `method`.
    #[must_use]
    pub fn stub_value(&self, method: &str) -> Option<Value> {
        self.state.lock().stubs.get(method).cloned()
    }

    /// Run `f` with shared access to the wrapped target.
    ///
    /// The target stays locked while `f` runs. Stubbed calls on this mock may
    /// be made from inside `f`, but a call that delegates to the target (or a
    /// [`Mock::responds_to`] query for an unstubbed name) blocks forever.
    pub fn with_inner<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.target.lock())
    }

    /// Run `f` with exclusive access to the wrapped target.
    ///
    /// Calls made this way bypass stubs and counters. The same locking rule as
    /// [`Mock::with_inner`] applies to calls on this mock from inside `f`.
    pub fn with_inner_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.target.lock())
    }

    /// Mutable access to the wrapped target.
    pub fn get_mut(&mut self) -> &mut T {
        self.target.get_mut()
    }

    /// Drop the mock and give back the wrapped target.
    pub fn into_inner(self) -> T {
        self.target.into_inner()
    }
}

impl<T: Respond> Mock<T> {
    /// Invoke `method` on the mock.
    ///
    /// Stubs win over native methods. A watched name is counted whenever the
    /// call is dispatched, whether it hits a stub or is delegated to the
    /// target.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMethod`] if `method` is neither stubbed nor
    /// implemented by the target (nothing is counted in that case), or the
    /// target's own error.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
        if let Some(value) = stub_hit(&self.state, method) {
            return Ok(value);
        }

        // The target is only locked once the stub table has been checked.
        let mut target = self.target.lock();
        match delegate(&self.state, &mut *target, method, args) {
            Some(result) => result,
            None => Err(Error::unsupported(mock_receiver_name(&*target), method)),
        }
    }

    /// Check if `method` is stubbed or natively implemented by the target.
    #[must_use]
    pub fn responds_to(&self, method: &str) -> bool {
        if self.is_stubbed(method) {
            return true;
        }
        self.target.lock().responds_to(method)
    }
}

impl<T> From<T> for Mock<T> {
    fn from(target: T) -> Self {
        Self::wrap(target)
    }
}

/// Mocks are dispatch targets themselves, so they can be nested or handed to
/// code that expects a [`Respond`] object.
impl<T: Respond> Respond for Mock<T> {
    fn respond(&mut self, method: &str, args: &[Value]) -> Option<Result<Value>> {
        if let Some(value) = stub_hit(&self.state, method) {
            return Some(Ok(value));
        }
        let Self { target, state } = self;
        delegate(state, target.get_mut(), method, args)
    }

    fn responds_to(&self, method: &str) -> bool {
        Mock::responds_to(self, method)
    }

    fn receiver_name(&self) -> String {
        mock_receiver_name(&*self.target.lock())
    }
}

impl<T> Debug for Mock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("Mock")
            .field("target", &std::any::type_name::<T>())
            .field("stubs", &state.stubs)
            .field("watch_counts", &state.watch_counts)
            .finish()
    }
}

fn mock_receiver_name<T: Respond + ?Sized>(target: &T) -> String {
    format!("mock of {}", target.receiver_name())
}

/// Stubbed value for `method`, counted if watched. Only the state lock is
/// taken.
fn stub_hit(state: &Mutex<MockState>, method: &str) -> Option<Value> {
    let mut state = state.lock();
    let value = state.stubs.get(method).cloned()?;
    state.count(method);
    trace!(method, "dispatching to stub");
    Some(value)
}

/// Hand an unstubbed call to the target. The state lock is not held while the
/// target runs.
fn delegate<T: Respond + ?Sized>(
    state: &Mutex<MockState>,
    target: &mut T,
    method: &str,
    args: &[Value],
) -> Option<Result<Value>> {
    let Some(result) = target.respond(method, args) else {
        trace!(method, "no stub or native method");
        return None;
    };
    state.lock().count(method);
    trace!(method, "delegated to target");
    Some(result)
}
