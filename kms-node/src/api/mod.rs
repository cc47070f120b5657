//! HTTP API module: one submodule per request kind, plus `health`/`info`.

pub(crate) mod app_sign;
pub(crate) mod health;
pub(crate) mod info;
pub(crate) mod pubkey;
pub(crate) mod secrets;
