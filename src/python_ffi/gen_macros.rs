use pyo3::exceptions::PyValueError;
use pyo3::{PyErr, PyResult};

/// Wrapper for an inner object that Python may still hold a reference to
/// after the Rust side has moved it elsewhere (a `Net` after
/// `build_trainer`, a `Trainer` after `teardown`).
///
/// Using a consumed object raises `ValueError` on the Python side instead of
/// crashing the interpreter.
pub(super) struct Consumable<T> {
    obj: Option<T>,
    what: &'static str,
}

impl<T> Consumable<T> {
    pub(super) fn acquire(obj: T, what: &'static str) -> Self {
        Self {
            obj: Some(obj),
            what,
        }
    }

    fn consumed_error(&self) -> PyErr {
        PyValueError::new_err(format!(
            "This {} object is consumed and cannot be used",
            self.what
        ))
    }

    pub(super) fn get_ref(&self) -> PyResult<&T> {
        match &self.obj {
            Some(obj) => Ok(obj),
            None => Err(self.consumed_error()),
        }
    }

    pub(super) fn get_ref_mut(&mut self) -> PyResult<&mut T> {
        match &mut self.obj {
            Some(obj) => Ok(obj),
            None => Err(self.consumed_error()),
        }
    }

    pub(super) fn release(&mut self) -> PyResult<T> {
        match self.obj.take() {
            Some(obj) => Ok(obj),
            None => Err(self.consumed_error()),
        }
    }
}

/// Converts the library's error enums into Python `ValueError`s through
/// their `Display` impls.
#[macro_export]
macro_rules! impl_value_error {
    (for $($t:ty),+) => {
        $(impl From<$t> for pyo3::PyErr {
            fn from(err: $t) -> Self {
                pyo3::exceptions::PyValueError::new_err(format!("{}", err))
            }
        }
        )*
    }
}
