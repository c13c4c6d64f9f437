//! varprep command-line front end.

pub mod cli;
pub mod io;
pub mod report;
