use std::sync::Arc;

use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{OpenApi, param::Path, payload::Json};

use crate::{
    application::usecases::create_record::CreateRecordRequest,
    domain::errors::DomainError,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_record,
        requests::CreateMessageRequestDto,
        responses::MessageRecordDto,
        security::JwtAuth,
    },
};

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    /// Standard creation path: stores the record and fires its relay activation.
    #[oai(
        path = "/tenants/:tenant_id/messages",
        method = "post",
        tag = EndpointsTags::Messages,
    )]
    pub async fn create_message(
        &self,
        auth: JwtAuth,
        tenant_id: Path<String>,
        request: Json<CreateMessageRequestDto>,
    ) -> PoemResult<Json<MessageRecordDto>> {
        let caller = auth.into_caller(&self.state.jwt)?;
        let request = request.0;

        let payload = CreateRecordRequest {
            tenant_id: tenant_id.0,
            thread_id: request.thread_id,
            text: request.text,
            attachment_type: request.attachment_type,
            attachment_payload: request.attachment_payload,
            destination_address: request.destination_address,
            sender_id: request.sender_id.unwrap_or(caller.uid),
            status: request.status.map(Into::into),
            extra: request.extra.unwrap_or_default().into_iter().collect(),
        };

        let record = self
            .state
            .create_record_usecase
            .execute(payload)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_record(&record)))
    }

    /// Reads a record to observe its delivery state.
    #[oai(
        path = "/tenants/:tenant_id/messages/:record_id",
        method = "get",
        tag = EndpointsTags::Messages,
    )]
    pub async fn get_message(
        &self,
        auth: JwtAuth,
        tenant_id: Path<String>,
        record_id: Path<String>,
    ) -> PoemResult<Json<MessageRecordDto>> {
        auth.into_caller(&self.state.jwt)?;

        let record = self
            .state
            .get_record_usecase
            .execute(&tenant_id.0, &record_id.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_record(&record)))
    }
}

fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::DuplicateRecord { .. } => StatusCode::CONFLICT,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    poem::Error::from_string(err.to_string(), status)
}
