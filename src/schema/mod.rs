//! Schema Module
//!
//! Table metadata: the digest (ordered column descriptors) and the key
//! sequence.
//!
//! ## Digest File (`digest.json`)
//! ```text
//! [
//!   {
//!     "name": "firstName",
//!     "capacity": 20
//!   },
//!   ...
//! ]
//! ```
//!
//! ## Sequence File (`digest.seq`)
//! ASCII decimal of the last key handed out by an insert. Tables written
//! before the sequence existed get it seeded from their column files.

mod digest;
mod sequence;

pub use digest::{ColumnDescriptor, Digest};
pub use sequence::Sequence;
