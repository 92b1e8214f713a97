use serde::{Deserialize, Serialize};

use crate::models::identity_document::TicketingServiceRemote;

/// A ticketing service endpoint as carried between screens
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketingService {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
    pub name: String,
}

impl TicketingService {
    pub fn from_remote(remote: &TicketingServiceRemote) -> Self {
        Self {
            id: remote.id.clone(),
            service_type: remote.service_type.clone(),
            service_endpoint: remote.service_endpoint.clone(),
            name: remote.name.clone(),
        }
    }

    pub fn to_remote(&self) -> TicketingServiceRemote {
        TicketingServiceRemote {
            id: self.id.clone(),
            service_type: self.service_type.clone(),
            service_endpoint: self.service_endpoint.clone(),
            name: self.name.clone(),
        }
    }
}

impl From<TicketingServiceRemote> for TicketingService {
    fn from(remote: TicketingServiceRemote) -> Self {
        Self {
            id: remote.id,
            service_type: remote.service_type,
            service_endpoint: remote.service_endpoint,
            name: remote.name,
        }
    }
}

impl From<TicketingService> for TicketingServiceRemote {
    fn from(service: TicketingService) -> Self {
        Self {
            id: service.id,
            service_type: service.service_type,
            service_endpoint: service.service_endpoint,
            name: service.name,
        }
    }
}
