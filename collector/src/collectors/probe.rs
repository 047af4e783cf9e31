use crate::{
    clients::{
        DeliveryClient,
        DeliveryMode,
    },
    error::ApiError,
};

/// Why a Delivery key cannot be used for collecting all workflow steps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessDenial {
    #[error("No API key provided")]
    MissingKey,
    #[error("Invalid Delivery Preview API key. Please verify your key and try again.")]
    InvalidKey,
    #[error("Invalid Delivery Preview API key. Please provide a key with 'Content preview' selected and try again.")]
    InsufficientPermission,
    #[error("Delivery API could not be reached: {0}")]
    Unreachable(String),
}

/// Returns the trimmed key, or [`AccessDenial::MissingKey`] if it is blank.
pub fn require_key(api_key: Option<&str>) -> Result<&str, AccessDenial> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AccessDenial::MissingKey)
}

/// Checks that the client's key grants environment access and 'Content preview'.
///
/// Published content is requested first with secure access. If that fails the key itself is wrong. Only then is
/// the Preview API asked, so a failure there means the key lacks the preview permission.
pub async fn probe_preview_access(client: &DeliveryClient) -> Result<(), AccessDenial> {
    if let Err(error) = client.probe(DeliveryMode::Published).await {
        debug!(%error, "Environment access denied");
        return Err(denial(error, AccessDenial::InvalidKey));
    }
    if let Err(error) = client.probe(DeliveryMode::Preview).await {
        debug!(%error, "Content preview access denied");
        return Err(denial(error, AccessDenial::InsufficientPermission));
    }
    Ok(())
}

fn denial(error: ApiError, on_status: AccessDenial) -> AccessDenial {
    if error.is_http_status() {
        on_status
    } else {
        AccessDenial::Unreachable(error.message)
    }
}
