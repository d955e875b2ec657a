mod console;
mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use console::ConsoleInputHandler;
pub use orchestrator::KioskOrchestrator;
pub use types::{ComponentState, KioskCommand, ShutdownReason, CONSOLE_HELP};
