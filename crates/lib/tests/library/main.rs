mod common;
mod install_tests;
mod staging_tests;
