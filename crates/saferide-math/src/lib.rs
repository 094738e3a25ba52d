//! saferide-math
//!
//! Arithmetic questions embedded in chat messages: `detect` decides whether an
//! utterance asks for a calculation and extracts the expression, `eval`
//! computes it over a closed grammar and `format_number` renders the result.

pub mod detect;
pub mod eval;

pub use detect::MathDetector;
pub use eval::{evaluate, format_number, sanitize, try_evaluate, EvalError};
