//! Metric name constants.

/// Gauge: `1` while an active key-share version exists, `0` otherwise.
pub const METRICS_ID_KEY_SHARE_ACTIVE: &str = "kms_key_share_active";

/// Counter: number of `app/sign` requests served.
pub const METRICS_ID_APP_SIGN_REQUESTS: &str = "kms_app_sign_requests_total";

/// Counter: number of `secrets` requests served.
pub const METRICS_ID_SECRETS_REQUESTS: &str = "kms_secrets_requests_total";

/// Counter: number of epoch transitions completed.
pub const METRICS_ID_EPOCH_TRANSITIONS: &str = "kms_epoch_transitions_total";

/// Counter: number of dealer contributions dropped for cryptographic
/// cause (`InvalidShare`, `DealerEquivocation`) within an epoch transition.
pub const METRICS_ID_DEALERS_REJECTED: &str = "kms_dealers_rejected_total";

/// Gauge: the currently-active epoch number.
pub const METRICS_ID_ACTIVE_EPOCH: &str = "kms_active_epoch";

/// Attribute key: attestation method name (`"gcp"`, `"intel"`, `"ecdsa"`).
pub const METRICS_ATTRID_ATTESTATION_METHOD: &str = "attestation_method";

/// Attribute key: the reason a dealer contribution was rejected.
pub const METRICS_ATTRID_REJECT_REASON: &str = "reason";

/// Installs the `metrics`-crate recorder and returns a handle implementors
/// expose on an admin endpoint. Left as a hook: production deployments wire
/// this to a concrete exporter (Prometheus, StatsD, ...); the core only
/// emits metric calls against the globally-installed recorder.
pub fn install_noop_recorder_if_unset() {
    // `metrics::set_global_recorder` only succeeds once per process; ignore
    // the error if a real recorder (e.g. a Prometheus exporter wired up by
    // the binary) already installed itself.
    let _ = metrics::set_global_recorder(metrics::NoopRecorder);
}
