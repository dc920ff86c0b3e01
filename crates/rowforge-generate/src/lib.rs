//! Value generation for rowforge.
//!
//! Turns table definitions into rows of value handles, keeps produced values
//! in a shared [`ValueStore`], and propagates identical values across columns
//! bound with copy-from-column generators.

pub mod counter;
pub mod errors;
pub mod generators;
pub mod handle;
pub mod materialize;
pub mod producer;
pub mod row;
pub mod sequence;
pub mod store;

pub use counter::AtomicCounter;
pub use errors::GenerationError;
pub use handle::ValueHandle;
pub use materialize::{InsertMaterializer, QueryMaterializer};
pub use producer::{RowProducer, Rows};
pub use row::{Field, Row};
pub use sequence::SequenceSupplier;
pub use store::ValueStore;
