//! End-to-end tests against the assembled router and a live listener.

mod auth_test;
mod helpers;
mod message_test;
mod ws_test;
