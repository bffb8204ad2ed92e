use crate::error::CoreError;
use easy_error::Error;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Failure value shared by every observer of a [`Promise`].
pub type SharedError = Rc<Error>;

/// Terminal outcome delivered to completion handlers.
pub type AsyncResult<T> = Result<T, SharedError>;

type Handler<T> = Box<dyn FnOnce(AsyncResult<T>)>;

/// The result cell of one asynchronous operation.
///
/// A promise starts pending and makes exactly one terminal transition,
/// via [`succeed`](Promise::succeed) or [`fail`](Promise::fail). Handlers
/// attached with [`on_completion`](Promise::on_completion) each fire
/// exactly once with the terminal result; a handler attached after
/// resolution fires immediately with the stored result rather than being
/// dropped.
///
/// `Promise` is a cheap-clone handle: the code resolving the operation
/// and any number of observers share the same cell. It is single-threaded
/// (not `Send`); hand-off across tasks is by full transfer.
pub struct Promise<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

struct Inner<T> {
    state: State<T>,
    handlers: Vec<Handler<T>>,
}

enum State<T> {
    Pending,
    Succeeded(T),
    Failed(SharedError),
}

impl<T: Clone + 'static> Promise<T> {
    /// Create a pending promise.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                state: State::Pending,
                handlers: Vec::new(),
            })),
        }
    }

    /// Register a handler for the terminal result.
    ///
    /// Handlers fire in registration order. If the promise is already
    /// resolved the handler fires before this call returns. No interior
    /// borrow is held while a handler runs, so handlers may attach
    /// further handlers or query the promise.
    pub fn on_completion<F>(&self, handler: F)
    where
        F: FnOnce(AsyncResult<T>) + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        let resolved = match &inner.state {
            State::Pending => None,
            State::Succeeded(v) => Some(Ok(v.clone())),
            State::Failed(e) => Some(Err(e.clone())),
        };
        match resolved {
            None => inner.handlers.push(Box::new(handler)),
            Some(result) => {
                drop(inner);
                handler(result);
            }
        }
    }

    /// Resolve the promise with a success value.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already resolved; resolving twice is a
    /// programming error, not a recoverable condition.
    pub fn succeed(&self, value: T) {
        let handlers = self.resolve(State::Succeeded(value.clone()));
        for h in handlers {
            h(Ok(value.clone()));
        }
    }

    /// Resolve the promise with a failure.
    ///
    /// # Panics
    ///
    /// Panics if the promise was already resolved.
    pub fn fail(&self, error: Error) {
        let shared: SharedError = Rc::new(error);
        let handlers = self.resolve(State::Failed(shared.clone()));
        for h in handlers {
            h(Err(shared.clone()));
        }
    }

    fn resolve(&self, terminal: State<T>) -> Vec<Handler<T>> {
        let mut inner = self.inner.borrow_mut();
        if !matches!(inner.state, State::Pending) {
            panic!("promise resolved twice");
        }
        inner.state = terminal;
        std::mem::take(&mut inner.handlers)
    }

    /// Whether a terminal transition has happened.
    pub fn is_complete(&self) -> bool {
        !matches!(self.inner.borrow().state, State::Pending)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.inner.borrow().state, State::Succeeded(_))
    }

    pub fn failed(&self) -> bool {
        matches!(self.inner.borrow().state, State::Failed(_))
    }

    /// The success value. Valid only after [`succeed`](Promise::succeed);
    /// otherwise fails with [`CoreError::InvalidState`].
    pub fn result(&self) -> Result<T, CoreError> {
        match &self.inner.borrow().state {
            State::Succeeded(v) => Ok(v.clone()),
            State::Pending => Err(CoreError::InvalidState("promise is still pending")),
            State::Failed(_) => Err(CoreError::InvalidState("promise failed")),
        }
    }

    /// The failure. Valid only after [`fail`](Promise::fail); otherwise
    /// fails with [`CoreError::InvalidState`].
    pub fn error(&self) -> Result<SharedError, CoreError> {
        match &self.inner.borrow().state {
            State::Failed(e) => Ok(e.clone()),
            State::Pending => Err(CoreError::InvalidState("promise is still pending")),
            State::Succeeded(_) => Err(CoreError::InvalidState("promise succeeded")),
        }
    }
}

impl<T: Clone + 'static> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner.borrow().state {
            State::Pending => "pending",
            State::Succeeded(_) => "succeeded",
            State::Failed(_) => "failed",
        };
        f.debug_struct("Promise").field("state", &state).finish()
    }
}
