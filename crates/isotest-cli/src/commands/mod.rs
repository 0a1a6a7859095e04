pub mod config;
pub mod selftest;
