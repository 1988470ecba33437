use std::collections::HashMap;

use poem_openapi::Object;
use serde_json::Value;

use crate::presentation::models::RecordStatusKind;

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct CreateMessageRequestDto {
    pub thread_id: Option<String>,
    #[oai(default)]
    pub text: String,
    pub attachment_type: Option<String>,
    pub attachment_payload: Option<String>,
    #[oai(validator(min_length = 1))]
    pub destination_address: String,
    /// Defaults to the authenticated caller.
    pub sender_id: Option<String>,
    /// Defaults to `pending_send`.
    pub status: Option<RecordStatusKind>,
    /// Extra fields stored and relayed verbatim.
    pub extra: Option<HashMap<String, Value>>,
}

/// Large-payload submission. Every field is optional at the transport level
/// so that missing values surface as `InvalidArgument`.
#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct SubmitMessageRequestDto {
    pub tenant_id: Option<String>,
    pub atendimento_id: Option<String>,
    pub text: Option<String>,
    pub base64_video: Option<String>,
    pub customer_phone: Option<String>,
    pub sender_uid: Option<String>,
    pub lead_id: Option<String>,
}
