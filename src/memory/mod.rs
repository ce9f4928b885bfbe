pub mod quantum_memory;
pub mod slot;

pub use quantum_memory::QuantumMemory;
pub use slot::{MemorySlot, SlotState};
