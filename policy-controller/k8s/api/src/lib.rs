#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod appprotect;
pub mod validation;

pub use self::{
    appprotect::{ApLogConf, ApPolicy, ApUserSig, Kind, UnknownKind},
    validation::{RequiredFields, Validate, ValidationError},
};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
pub use kube::{
    core::{ApiResource, DynamicObject, GroupVersionKind, ObjectMeta},
    Resource, ResourceExt,
};
