//! Library to run scheduled backups with [Duplicacy][duplicacy].
//!
//! A [job](job::Job) rotates its run log and then performs the requested
//! [phases]: backup (followed by copies between storages), prune and check.
//! The output of every duplicacy invocation is classified line by line and
//! the statistics are collected into a [report](report::JobReport).
//!
//! [duplicacy]: https://github.com/gilbertchen/duplicacy

#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod duplicacy;
pub mod job;
pub mod phases;
pub mod report;
pub mod runlog;
pub mod util;
