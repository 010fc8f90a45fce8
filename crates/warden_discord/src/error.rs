//! Mapping Serenity failures onto [`PlatformError`].

use serenity::http::HttpError;
use warden_error::{PlatformError, PlatformErrorKind};

/// Classify a Serenity error.
///
/// HTTP 403 becomes [`PlatformErrorKind::MissingPermission`], 404 becomes
/// [`PlatformErrorKind::NotFound`], 401 becomes
/// [`PlatformErrorKind::InvalidToken`]; gateway failures keep their own kind.
#[track_caller]
pub fn platform_error(err: serenity::Error) -> PlatformError {
    let kind = match &err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
            match response.status_code.as_u16() {
                401 => PlatformErrorKind::InvalidToken,
                403 => PlatformErrorKind::MissingPermission(response.error.message.clone()),
                404 => PlatformErrorKind::NotFound(response.error.message.clone()),
                _ => PlatformErrorKind::Api(err.to_string()),
            }
        }
        serenity::Error::Gateway(e) => PlatformErrorKind::Gateway(e.to_string()),
        _ => PlatformErrorKind::Api(err.to_string()),
    };
    PlatformError::new(kind)
}

/// Whether a Serenity error means the entity does not exist.
pub fn is_not_found(err: &serenity::Error) -> bool {
    matches!(
        err,
        serenity::Error::Http(HttpError::UnsuccessfulRequest(response))
            if response.status_code.as_u16() == 404
    )
}
