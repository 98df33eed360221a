//! Feature assembly for blend samples.
//!
//! A [`BlendSample`] flattens into 55 named columns in a fixed order:
//! `Component{1..5}_fraction` then `Component{i}_Property{1..10}` for each
//! component in turn. Training may append ten `Weighted_Avg_Property{j}`
//! columns on top of that via [`Table::engineer`].
mod columns;
mod sample;
mod table;

pub use columns::*;
pub use sample::*;
pub use table::*;
