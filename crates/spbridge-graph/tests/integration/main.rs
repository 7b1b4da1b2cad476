//! Integration tests for spbridge-graph
//!
//! Uses wiremock to simulate the Microsoft Graph API and verifies
//! end-to-end behavior of the Graph backend: library resolution, paged
//! listings, transfers and item operations.

mod common;

mod test_operations;
mod test_transfers;
