//! End-to-end tests driving the yabt binary against temporary workspaces.

mod common;

mod build_tests;
mod sync_tests;
