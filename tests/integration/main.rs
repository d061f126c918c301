//! Integration tests

mod api_tests;
mod router_tests;
