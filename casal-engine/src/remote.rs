//! Remote authority seam
//!
//! The engine talks to the authority through this trait so reconciliation
//! logic can be exercised against an in-process fake; production wires in the
//! HTTP gateway.

use async_trait::async_trait;

use casal_client::{ClientResult, HttpClient, JoinRequest, RemoteEvent, RemotePerson};
use shared::ids::RemoteId;

/// Operations the engine needs from the membership authority
#[async_trait]
pub trait Authority: Send + Sync {
    /// Exchange credentials for an opaque bearer token
    async fn login(&self, nif: &str, password: &str) -> ClientResult<String>;

    /// Fetch the authenticated user's own record
    async fn person_data(&self, token: &str) -> ClientResult<RemotePerson>;

    /// Fetch another member's record by authority id
    async fn account_data(&self, token: &str, user_id: RemoteId) -> ClientResult<RemotePerson>;

    /// Fetch the full current event snapshot
    async fn events_list(&self, token: &str) -> ClientResult<Vec<RemoteEvent>>;

    /// Create a table, join one, or set the attendance flag
    async fn join_event(
        &self,
        token: &str,
        event: RemoteId,
        request: &JoinRequest,
    ) -> ClientResult<()>;
}

#[async_trait]
impl Authority for HttpClient {
    async fn login(&self, nif: &str, password: &str) -> ClientResult<String> {
        HttpClient::login(self, nif, password).await
    }

    async fn person_data(&self, token: &str) -> ClientResult<RemotePerson> {
        HttpClient::person_data(self, token).await
    }

    async fn account_data(&self, token: &str, user_id: RemoteId) -> ClientResult<RemotePerson> {
        HttpClient::account_data(self, token, user_id).await
    }

    async fn events_list(&self, token: &str) -> ClientResult<Vec<RemoteEvent>> {
        HttpClient::events_list(self, token).await
    }

    async fn join_event(
        &self,
        token: &str,
        event: RemoteId,
        request: &JoinRequest,
    ) -> ClientResult<()> {
        HttpClient::join_event(self, token, event, request).await
    }
}
