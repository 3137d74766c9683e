pub mod machine;
pub mod scheduler;
pub mod types;


pub use machine::SessionStateMachine;
pub use scheduler::*;
pub use types::*;
