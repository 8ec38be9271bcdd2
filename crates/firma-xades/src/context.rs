#![forbid(unsafe_code)]

//! Per-call validation settings.

use chrono::{DateTime, Utc};
use firma_x509::OcspClient;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_OCSP_TIMEOUT: Duration = Duration::from_secs(5);

/// Settings for one or more validations. Holds no per-document state and
/// can be shared between threads.
#[derive(Clone)]
pub struct ValidationContext {
    /// Instant used for the certificate expiration check. `None` means the
    /// system clock at call time.
    pub verification_time: Option<DateTime<Utc>>,
    /// Recompute and compare every `ds:Reference` digest.
    pub verify_references: bool,
    /// Revocation backend. Without one no network request is made.
    pub ocsp_client: Option<Arc<dyn OcspClient>>,
    /// Passed to the OCSP client.
    pub ocsp_timeout: Duration,
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self {
            verification_time: None,
            verify_references: true,
            ocsp_client: None,
            ocsp_timeout: DEFAULT_OCSP_TIMEOUT,
        }
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("verification_time", &self.verification_time)
            .field("verify_references", &self.verify_references)
            .field("ocsp_client", &self.ocsp_client.as_ref().map(|_| "<dyn OcspClient>"))
            .field("ocsp_timeout", &self.ocsp_timeout)
            .finish()
    }
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verification_time(mut self, at: DateTime<Utc>) -> Self {
        self.verification_time = Some(at);
        self
    }

    pub fn with_reference_checks(mut self, enabled: bool) -> Self {
        self.verify_references = enabled;
        self
    }

    pub fn with_ocsp_client(mut self, client: Arc<dyn OcspClient>) -> Self {
        self.ocsp_client = Some(client);
        self
    }

    pub fn with_ocsp_timeout(mut self, timeout: Duration) -> Self {
        self.ocsp_timeout = timeout;
        self
    }

    /// The instant the expiration snapshot is taken at.
    pub fn now(&self) -> DateTime<Utc> {
        self.verification_time.unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let ctx = ValidationContext::default();
        assert!(ctx.verify_references);
        assert!(ctx.ocsp_client.is_none());
        assert_eq!(ctx.ocsp_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_fixed_time() {
        let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let ctx = ValidationContext::new().with_verification_time(at);
        assert_eq!(ctx.now(), at);
        assert!(format!("{ctx:?}").contains("verification_time"));
    }

    #[test]
    fn test_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationContext>();
    }
}
