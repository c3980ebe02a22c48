mod cache_tests;
mod classpath_tests;
mod common;
