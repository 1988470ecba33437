pub mod create_record;
pub mod get_record;
pub mod submit_large_message;
