//! Time-ordered 64-bit ID generation
//!
//! Snowflake-style layout: 41 bits of milliseconds since a fixed epoch,
//! 10 bits of node number, 12 bits of per-millisecond sequence. Each entity
//! kind gets its own node number so concurrent writers of different tables
//! can never collide, and IDs within one process are strictly monotonic.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Custom epoch: 2024-01-01T00:00:00Z, in milliseconds.
const EPOCH_MS: u64 = 1_704_067_200_000;

const NODE_BITS: u8 = 10;
const SEQUENCE_BITS: u8 = 12;
const MAX_NODE: u16 = (1 << NODE_BITS) - 1;
const SEQUENCE_MASK: u16 = (1 << SEQUENCE_BITS) - 1;

/// Node numbers, one per entity kind.
pub mod nodes {
    pub const RESOURCE: u16 = 1;
    pub const CHUNK: u16 = 2;
    pub const TRANSLATED_RESOURCE: u16 = 3;
    pub const TRANSLATED_CHUNK: u16 = 4;
    pub const KB_BINDING: u16 = 5;
}

/// A single-node snowflake generator.
pub struct IdGenerator {
    node: u16,
    state: Mutex<State>,
}

struct State {
    last_ms: u64,
    sequence: u16,
}

impl IdGenerator {
    /// Create a generator for the given node number (0..1024).
    pub fn new(node: u16) -> Self {
        assert!(node <= MAX_NODE, "node number out of range");
        Self {
            node,
            state: Mutex::new(State {
                last_ms: 0,
                sequence: 0,
            }),
        }
    }

    /// Generate the next ID. Monotonic within the process; if the sequence
    /// for the current millisecond is exhausted, spins to the next one.
    pub fn next_id(&self) -> i64 {
        let mut state = self.state.lock().expect("id generator lock poisoned");

        let mut now = current_ms();
        // A clock that stepped backwards must not reissue a window.
        if now < state.last_ms {
            now = state.last_ms;
        }

        if now == state.last_ms {
            state.sequence = (state.sequence + 1) & SEQUENCE_MASK;
            if state.sequence == 0 {
                while now <= state.last_ms {
                    now = current_ms().max(state.last_ms + 1);
                }
            }
        } else {
            state.sequence = 0;
        }
        state.last_ms = now;

        let timestamp = now - EPOCH_MS;
        ((timestamp as i64) << (NODE_BITS + SEQUENCE_BITS))
            | ((self.node as i64) << SEQUENCE_BITS)
            | state.sequence as i64
    }
}

fn current_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_monotonic() {
        let generator = IdGenerator::new(nodes::RESOURCE);
        let mut last = 0;
        for _ in 0..10_000 {
            let id = generator.next_id();
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn test_node_partitioning() {
        let a = IdGenerator::new(nodes::RESOURCE);
        let b = IdGenerator::new(nodes::CHUNK);

        let mut seen = HashSet::new();
        for _ in 0..1_000 {
            assert!(seen.insert(a.next_id()));
            assert!(seen.insert(b.next_id()));
        }
    }

    #[test]
    #[should_panic]
    fn test_node_out_of_range() {
        IdGenerator::new(MAX_NODE + 1);
    }
}
