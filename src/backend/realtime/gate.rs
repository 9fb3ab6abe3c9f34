/**
 * Connection Gate
 *
 * Authenticates an inbound real-time connection before it is admitted.
 * Fails closed: any verification problem (missing, malformed, expired,
 * or unknown-subject token) refuses the connection with a reason and
 * no session state is created. The gate never retries; the client must
 * reconnect with a fresh credential.
 */

use uuid::Uuid;

use crate::backend::auth::tokens::verify_token;
use crate::backend::error::MessagingError;

/// Identity attached to a connection after the gate admits it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
}

/// Verify the credential presented by a connection attempt
///
/// # Arguments
/// * `token` - the opaque credential from the connection metadata, if
///   any was supplied
///
/// # Returns
/// The resolved identity, or an `Authentication` error describing why
/// the connection was refused.
pub fn authenticate(token: Option<&str>) -> Result<AuthenticatedUser, MessagingError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MessagingError::authentication("missing credential token"))?;

    let claims = verify_token(token)
        .map_err(|e| MessagingError::authentication(format!("token verification failed: {}", e)))?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|e| MessagingError::authentication(format!("invalid subject in token: {}", e)))?;

    Ok(AuthenticatedUser {
        user_id,
        username: claims.display_name(),
    })
}
