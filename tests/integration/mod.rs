//! Integration test module
//!
//! Interleaved faults across threads and tasks, and randomized workloads.

mod property_tests;
