//! Data structures for qPCR cleaning and RQ analysis

mod ct_matrix;
mod raw_table;

pub use ct_matrix::CtMatrix;
pub use raw_table::{RawReading, RawTable};
