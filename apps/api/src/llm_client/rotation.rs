//! Round-robin rotation over a small pool of vendor API keys.
//!
//! The cursor is shared by every request holding the same `Arc<KeyRotator>`.
//! Ordering is relaxed: rotation spreads load across keys, it is not a
//! correctness guarantee.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the key under the cursor and advances the cursor by one.
    pub fn next_key(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed);
        Some(&self.keys[i % self.keys.len()])
    }

    /// Returns the key under the cursor without moving it.
    pub fn current(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let i = self.cursor.load(Ordering::Relaxed);
        Some(&self.keys[i % self.keys.len()])
    }

    pub fn advance(&self) {
        self.cursor.fetch_add(1, Ordering::Relaxed);
    }
}

/// Masks a key for logs: keeps the last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}
