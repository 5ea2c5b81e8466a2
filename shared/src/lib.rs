pub mod conversation;
pub mod cycle;

pub use conversation::{Role, Turn};
pub use cycle::{CycleOutcome, Phase};
