#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod resource_ref;
pub mod signature;

pub use self::{
    resource_ref::{parse_resource_reference, parse_resource_reference_list, ResourceKey},
    signature::{
        requirements_satisfied, RevisionWindow, Signature, SignatureRequirement, Timestamp,
    },
};
