//! Node handle with generational index
//!
//! Nodes are lightweight handles (8 bytes) that reference data in a scene.
//! The generation counter prevents a destroyed node's handle from aliasing
//! a node created later in the same slot.

use std::fmt;

/// Node handle (generation-indexed for safety)
///
/// Format: [32-bit index | 32-bit generation]
/// - Index: Position in the scene's node array
/// - Generation: Incremented when the node is destroyed
///
/// Handles are only meaningful inside the scene that produced them and are
/// never persisted. Persistent identity is the name path computed by the
/// placement registry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Pack into a 64-bit integer (for logging and host interop)
    pub fn to_bits(&self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }

    /// Unpack from a 64-bit integer
    pub fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_round_trip() {
        let id = NodeId::new(42, 7);
        assert_eq!(NodeId::from_bits(id.to_bits()), id);
        assert_eq!(id.to_string(), "42v7");
    }
}
