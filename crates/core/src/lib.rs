//! Core business logic for lectern.

pub mod services;

pub use services::*;
