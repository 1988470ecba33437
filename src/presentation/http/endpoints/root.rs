use std::sync::Arc;

use poem_openapi::Tags;

use crate::application::{
    services::jwt::JwtService,
    usecases::{
        create_record::CreateRecordUseCase, get_record::GetRecordUseCase,
        submit_large_message::SubmitLargeMessageUseCase,
    },
};

pub struct ApiState {
    pub create_record_usecase: Arc<CreateRecordUseCase>,
    pub get_record_usecase: Arc<GetRecordUseCase>,
    pub submit_large_message_usecase: Arc<SubmitLargeMessageUseCase>,
    pub jwt: JwtService,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Messages,
    Submissions,
}
