mod common;
mod composition_tests;
mod matrix_tests;
