use poem_openapi::payload::Json;

use crate::{
    application::usecases::submit_large_message::{SubmissionError, SubmitLargeMessageResponse},
    domain::models::MessageRecord,
    presentation::http::responses::{
        ErrorDto, MessageRecordDto, SubmitMessageResponse, SubmitMessageResponseDto,
    },
};

pub fn map_record(record: &MessageRecord) -> MessageRecordDto {
    MessageRecordDto {
        record_id: record.record_id.clone(),
        tenant_id: record.tenant_id.clone(),
        thread_id: record.thread_id.clone(),
        text: record.text.clone(),
        attachment_type: record.attachment_type.clone(),
        attachment_payload: record.attachment_payload.clone(),
        destination_address: record.destination_address.clone(),
        sender_id: record.sender_id.clone(),
        status: record.status.as_str().to_string(),
        created_at: record.created_at.to_rfc3339(),
        processed_at: record.processed_at.map(|at| at.to_rfc3339()),
        error_message: record.error_message.clone(),
        relay_response_status: record.relay_response_status,
        extra: record
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}

pub fn map_submission(result: Result<SubmitLargeMessageResponse, SubmissionError>) -> SubmitMessageResponse {
    match result {
        Ok(response) => SubmitMessageResponse::Ok(Json(SubmitMessageResponseDto {
            success: response.success,
            id: response.id,
        })),
        Err(err) => {
            let body = Json(ErrorDto {
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
            match err {
                SubmissionError::Unauthenticated => SubmitMessageResponse::Unauthenticated(body),
                SubmissionError::InvalidArgument(_) => SubmitMessageResponse::InvalidArgument(body),
                SubmissionError::Internal(_) => SubmitMessageResponse::Internal(body),
            }
        }
    }
}
