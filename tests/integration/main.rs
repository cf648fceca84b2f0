#[path = "../common/mod.rs"]
mod common;

mod env_files;
mod layered;
mod report;
