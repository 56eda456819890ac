#![doc = include_str!("../README.md")]

pub mod comparison;
pub mod generators;
pub mod strategies;

pub use proptest;
pub use test_strategy;
