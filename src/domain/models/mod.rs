pub mod delivery;
pub mod record;
pub mod summary;

pub use delivery::{DeliveryOutcome, OutcomeUpdate, UNKNOWN_DELIVERY_ERROR};
pub use record::{MessageRecord, RecordStatus, is_valid_key};
pub use summary::{ConversationSummary, SummaryUpdate, preview_for_attachment};
