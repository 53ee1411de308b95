mod common;
mod install_tests;
mod release_tests;
