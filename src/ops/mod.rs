//! Scalar and vector primitives used by the LSTM cell.
//! Everything here is a pure function of its arguments.

mod arithmetic;
mod math;

pub use arithmetic::*;
pub use math::*;
