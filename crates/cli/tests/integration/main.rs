mod common;
mod compile_tests;
mod run_tests;
