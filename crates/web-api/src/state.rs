use std::sync::Arc;

use application::{MessageService, ParticipantService};

#[derive(Clone)]
pub struct AppState {
    pub participant_service: Arc<ParticipantService>,
    pub message_service: Arc<MessageService>,
}

impl AppState {
    pub fn new(
        participant_service: Arc<ParticipantService>,
        message_service: Arc<MessageService>,
    ) -> Self {
        Self {
            participant_service,
            message_service,
        }
    }
}
