use std::collections::HashMap;

use poem_openapi::{ApiResponse, Object, payload::Json};
use serde_json::Value;

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct MessageRecordDto {
    pub record_id: String,
    pub tenant_id: String,
    pub thread_id: Option<String>,
    pub text: String,
    pub attachment_type: Option<String>,
    pub attachment_payload: Option<String>,
    pub destination_address: String,
    pub sender_id: String,
    pub status: String,
    pub created_at: String,
    pub processed_at: Option<String>,
    pub error_message: Option<String>,
    pub relay_response_status: Option<u16>,
    pub extra: HashMap<String, Value>,
}

#[derive(Object, Debug)]
pub struct SubmitMessageResponseDto {
    pub success: bool,
    pub id: String,
}

#[derive(Object, Debug)]
pub struct ErrorDto {
    pub kind: String,
    pub message: String,
}

#[derive(ApiResponse)]
pub enum SubmitMessageResponse {
    #[oai(status = 200)]
    Ok(Json<SubmitMessageResponseDto>),
    #[oai(status = 400)]
    InvalidArgument(Json<ErrorDto>),
    #[oai(status = 401)]
    Unauthenticated(Json<ErrorDto>),
    #[oai(status = 500)]
    Internal(Json<ErrorDto>),
}
