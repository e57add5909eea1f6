use uuid::Uuid;

use crate::middleware::Caller;

use super::AuthError;

/// Allow a mutation only when the verified caller owns the resource.
///
/// Ownership is the only dimension: there are no roles and no bypass.
/// A caller without a verified identity gets a 401-class error, never
/// `Forbidden`. Returns the caller's id on success.
pub fn authorize_owner_action(caller: &Caller, owner: Uuid) -> Result<Uuid, AuthError> {
    let user = caller.require()?;

    if user.user_id != owner {
        tracing::warn!("User {} denied mutation of resource owned by {}", user.user_id, owner);
        return Err(AuthError::Forbidden);
    }

    Ok(user.user_id)
}
