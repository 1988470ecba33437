pub mod outcome_writer;
pub mod relay_trigger;
