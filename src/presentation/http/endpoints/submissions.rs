use std::sync::Arc;

use poem_openapi::{OpenApi, param::Header, payload::Json};

use crate::{
    application::usecases::submit_large_message::SubmitLargeMessageRequest,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_submission,
        requests::SubmitMessageRequestDto,
        responses::SubmitMessageResponse,
        security::caller_from_header,
    },
};

#[derive(Clone)]
pub struct SubmissionsEndpoints {
    state: Arc<ApiState>,
}

impl SubmissionsEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl SubmissionsEndpoints {
    /// Accepts an embedded video, relays it inline and stores the record.
    /// `success` means the record was stored; read the record for delivery state.
    #[oai(path = "/submissions", method = "post", tag = EndpointsTags::Submissions)]
    pub async fn submit(
        &self,
        #[oai(name = "Authorization")] authorization: Header<Option<String>>,
        request: Json<SubmitMessageRequestDto>,
    ) -> SubmitMessageResponse {
        let caller = caller_from_header(authorization.0.as_deref(), &self.state.jwt);
        let request = request.0;

        let payload = SubmitLargeMessageRequest {
            tenant_id: request.tenant_id,
            conversation_id: request.atendimento_id,
            text: request.text,
            base64_video: request.base64_video,
            customer_phone: request.customer_phone,
            sender_uid: request.sender_uid,
            lead_id: request.lead_id,
        };

        map_submission(
            self.state
                .submit_large_message_usecase
                .execute(caller.as_ref(), payload)
                .await,
        )
    }
}
