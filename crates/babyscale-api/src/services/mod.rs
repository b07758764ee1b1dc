//! Background services.

pub mod result_sweeper;

pub use result_sweeper::ResultSweeper;
