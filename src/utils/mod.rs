//! Shared utility functions

pub mod xml;
