//! A widget with a few unfinished methods.

use std::fmt;

use crate::errors::ErrorUtil;

pub struct Widget {
    value: i32,
}

impl Widget {
    /// Not wired up yet.
    #[unsupported_operation(error = crate::errors::NotSupported)]
    pub fn get_value(&self) -> i32 {}

    #[unsupported_operation(error = crate::errors::NotSupported, message = "resize is not supported")]
    pub fn resize(&mut self, factor: i32) -> i32 {
        let scaled = self.value * factor;
        scaled
    }

    pub fn reset(&mut self) {
        self.value = 0; // untouched
    }
}

impl fmt::Display for Widget {
    #[unsupported_operation(pass_owner)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}
