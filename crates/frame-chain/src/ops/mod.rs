//! Table transformation operations.
//!
//! Every operation borrows its input table and returns a new one; none of
//! them mutate the table they are given.

pub mod derive;
pub mod fan_out;
pub mod filter;
pub mod numeric;
pub mod select;
pub mod split;

pub use derive::{ColumnFn, Derivation, Derivations, derive_columns};
pub use fan_out::{FanOut, NumericFanFn, ValueFanFn, multi_output};
pub use filter::{MaskFn, RowPredicate, filter_rows};
pub use numeric::{if_else, row_sum, select_choice};
pub use select::{ColumnSelector, NamesFn, keep_columns_by_mean, select_columns};
pub use split::split_column;
