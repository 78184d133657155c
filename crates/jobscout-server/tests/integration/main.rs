mod api_tests;
mod common;
