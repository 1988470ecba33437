pub mod in_process;
pub mod jetstream;
pub mod webhook;
