//! Integration tests for the SharePoint REST backend

mod common;
