//! Integration tests for the Key Vault client

mod test_secrets;
