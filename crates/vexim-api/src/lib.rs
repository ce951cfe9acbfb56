// vexim-api: Async Rust client for the Cisco SD-WAN vManage REST API

pub mod auth;
pub mod client;
pub mod error;

pub use client::{
    ClientOptions, DUPLICATE_DIAGNOSTICS, DeleteOutcome, PostOutcome, RequestContext, TlsMode,
    UNDELETABLE_DIAGNOSTICS, VmanageClient,
};
pub use error::Error;
