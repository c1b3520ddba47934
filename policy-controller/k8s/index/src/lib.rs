//! App Protect resource index
//!
//! The index mirrors three App Protect resource kinds and decides which of them may be
//! referenced by generated NGINX configuration:
//!
//! - An `APLogConf` is valid when it passes structural validation.
//! - An `APUserSig` is valid when it passes validation and owns its tag. When several
//!   signatures share a non-empty tag, the oldest one owns it.
//! - An `APPolicy` is valid when it passes validation, its signature requirements parse, and
//!   each requirement is satisfied by some valid signature.
//!
//! ```text
//! [ APPolicy ] -> signature requirements <- [ APUserSig ]
//! ```
//!
//! Because adding or removing a signature can change which signature owns a tag, and thus
//! which policies are satisfied, every signature mutation reconciles the whole index. Each
//! operation reports the resulting changes and problems to the caller, which writes
//! configuration and reports events.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod change;
mod configuration;
mod index;
mod log_conf;
mod policy;
mod reconcile;
mod record;
mod user_sig;


pub use self::{
    change::{Change, Op, Problem, Resource, SignatureSetChange, REJECTED},
    configuration::{Configuration, GetError},
    index::{Index, SharedIndex, Update},
    log_conf::LogConfRecord,
    policy::PolicyRecord,
    record::{resource_key, InvalidReason},
    user_sig::UserSigRecord,
};
