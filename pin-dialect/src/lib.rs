//! Plugin IR Dialect
//!
//! A closed, versioned set of typed operations describing the host
//! compiler's IR outside the host process. Everything that crosses the
//! plugin boundary is expressed in these types; passes on the server side
//! only ever see and mutate a [`DialectModule`].
//!
//! The op set is closed on purpose: adding a construct changes
//! [`DIALECT_VERSION`], and the protocol refuses to talk across versions.

pub mod types;
pub mod value;
pub mod ops;
pub mod block;
pub mod func;
pub mod module;
pub mod verify;
pub mod callgraph;

pub use types::Type;
pub use value::{BlockId, Operand, ValueId};
pub use ops::{BinOp, CmpPred, ConvKind, OpKind, Operation, UnOp};
pub use block::Block;
pub use func::{FuncAttrs, FuncOp, InlineHint, Param};
pub use module::{DialectModule, GlobalInit, GlobalOp, Linkage};
pub use verify::{verify, VerifyError};
pub use callgraph::{CallGraph, CallSite};

/// Version of the operation set. Bump on any change to the types in this crate.
pub const DIALECT_VERSION: u32 = 1;
