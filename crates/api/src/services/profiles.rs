use std::sync::Arc;

use officehours_core::{
    errors::{SchedulingError, SchedulingResult},
    models::identity::{Identity, UpsertProfileRequest, UserProfile},
};
use officehours_db::SchedulingStore;
use tracing::debug;

/// Directory entries for the identities the gateway vouches for.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn SchedulingStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn upsert(
        &self,
        caller: &Identity,
        request: UpsertProfileRequest,
    ) -> SchedulingResult<UserProfile> {
        let name = request.name.trim();
        let email = request.email.trim();

        if name.is_empty() {
            return Err(SchedulingError::Validation(
                "Name must not be empty".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(SchedulingError::Validation(format!(
                "Invalid email address: {}",
                email
            )));
        }

        debug!(user = %caller, "upserting profile");
        let profile = UserProfile {
            id: caller.id,
            kind: caller.kind,
            name: name.to_string(),
            email: email.to_string(),
        };
        Ok(self.store.upsert_profile(profile).await?)
    }
}
