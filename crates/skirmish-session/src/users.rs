//! The registry of logged-in usernames.

use std::collections::HashSet;
use std::sync::Mutex;

/// Tracks which usernames are currently claimed.
///
/// A name belongs to exactly one live connection; it is released when
/// that connection logs out or goes away.
#[derive(Debug, Default)]
pub struct UserRegistry {
    names: Mutex<HashSet<String>>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a username. Returns `false` if it is empty or already taken.
    pub fn login(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let mut names = self.names.lock().expect("user registry lock poisoned");
        names.insert(name.to_string())
    }

    /// Releases a username. Returns `false` if it was not logged in.
    pub fn logout(&self, name: &str) -> bool {
        let mut names = self.names.lock().expect("user registry lock poisoned");
        names.remove(name)
    }

    pub fn is_logged_in(&self, name: &str) -> bool {
        let names = self.names.lock().expect("user registry lock poisoned");
        names.contains(name)
    }

    pub fn count(&self) -> usize {
        let names = self.names.lock().expect("user registry lock poisoned");
        names.len()
    }
}
