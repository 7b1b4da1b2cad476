//! Integration tests for spbridge-auth
//!
//! Uses wiremock to stand in for the Microsoft identity platform and the
//! instance metadata service, and drives credentials through the public
//! factory.


mod test_default_chain;
mod test_username_password;
