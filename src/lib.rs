#![warn(clippy::all)]
#![doc = include_str!("../README.md")]

// Modules that make up the data grid library.
mod args;
mod classify;
mod dataset;
mod error;
mod file_extension;
mod filter;
mod filter_state;
mod grid;
mod mock;
mod reader;
mod row;
mod scalar;
mod schema;
mod session;
mod sort;
mod store;
mod traits;
mod upload;

// Publicly expose the contents of these modules.
pub use self::{
    // add to lib
    args::{Arguments, FilterArgument},
    classify::*,
    dataset::*,
    error::*,
    file_extension::*,
    filter::*,
    filter_state::*,
    grid::*,
    mock::*,
    reader::*,
    row::*,
    scalar::*,
    schema::*,
    session::*,
    sort::*,
    store::*,
    traits::*,
    upload::*,
};
