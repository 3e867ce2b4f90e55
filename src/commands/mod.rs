//! # CLI Command Implementations
//!
//! This module contains the implementation for each subcommand of the
//! `project-graph` command-line tool.

pub mod gen_props;
pub mod load;
