use poem_openapi::Enum;

use crate::domain::models::RecordStatus;

/// Statuses an upstream writer may create a record with.
#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordStatusKind {
    #[oai(rename = "pending_send")]
    PendingSend,
    #[oai(rename = "sent")]
    Sent,
    #[oai(rename = "error")]
    Error,
}

impl From<RecordStatusKind> for RecordStatus {
    fn from(value: RecordStatusKind) -> Self {
        match value {
            RecordStatusKind::PendingSend => RecordStatus::PendingSend,
            RecordStatusKind::Sent => RecordStatus::Sent,
            RecordStatusKind::Error => RecordStatus::Error,
        }
    }
}
