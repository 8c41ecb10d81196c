//! Recurrent layers.

pub mod lstm;
