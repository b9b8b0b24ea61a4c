//! Demo credential store
//!
//! A static user table for the bundled binary. Embedders supply their own
//! `Authenticator` implementation instead.

use std::collections::HashMap;
use std::sync::LazyLock;

pub(crate) static CREDENTIALS: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| {
        let mut creds = HashMap::new();
        creds.insert("alice", "alice123");
        creds.insert("bob", "bob123");
        creds.insert("admin", "admin123");
        creds
    });
