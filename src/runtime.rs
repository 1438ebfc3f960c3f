//! Dynamic runtime model for Mython programs: shared values, user classes
//! with single inheritance, the per-call name environment, and the output
//! context handed to every `execute`.

mod class;
mod compare;
mod context;
mod error;
mod value;

pub use class::{Class, ClassInstance, Method};
pub use compare::{equal, greater, greater_or_equal, less, less_or_equal, not_equal};
pub use context::{Context, DummyContext, SimpleContext};
pub use error::{ExecResult, RuntimeError, Unwind};
pub use value::Value;

use std::collections::HashMap;

/// Per-frame name environment. One flat map per frame; there is no lexical
/// scope chain, a method sees only `self` and its own parameters and locals.
pub type Closure = HashMap<String, Value>;
