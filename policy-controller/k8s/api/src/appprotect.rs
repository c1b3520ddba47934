use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use std::{fmt, ops::Deref, str::FromStr};
use thiserror::Error;

pub const API_GROUP: &str = "appprotect.f5.com";
pub const API_VERSION: &str = "v1beta1";

/// The App Protect resource kinds mirrored by the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Policy,
    LogConf,
    UserSig,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("Unknown App Protect resource kind {0}")]
pub struct UnknownKind(pub String);

/// An `APPolicy` resource.
#[derive(Clone, Debug)]
pub struct ApPolicy(pub DynamicObject);

/// An `APLogConf` resource.
#[derive(Clone, Debug)]
pub struct ApLogConf(pub DynamicObject);

/// An `APUserSig` resource.
#[derive(Clone, Debug)]
pub struct ApUserSig(pub DynamicObject);

// === impl Kind ===

impl Kind {
    pub const ALL: [Kind; 3] = [Kind::Policy, Kind::LogConf, Kind::UserSig];

    /// The resource's `kind` as it appears in manifests.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Policy => "APPolicy",
            Self::LogConf => "APLogConf",
            Self::UserSig => "APUserSig",
        }
    }

    pub const fn plural(self) -> &'static str {
        match self {
            Self::Policy => "appolicies",
            Self::LogConf => "aplogconfs",
            Self::UserSig => "apusersigs",
        }
    }

    /// The short name used in lookup errors.
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::Policy => "Policy",
            Self::LogConf => "LogConf",
            Self::UserSig => "UserSig",
        }
    }

    /// The name used in validation errors.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Policy => "Policy",
            Self::LogConf => "Log Configuration",
            Self::UserSig => "User Signature",
        }
    }

    pub fn gvk(self) -> GroupVersionKind {
        GroupVersionKind::gvk(API_GROUP, API_VERSION, self.name())
    }

    /// Describes the kind for dynamic API clients and watches.
    pub fn api_resource(self) -> ApiResource {
        ApiResource::from_gvk_with_plural(&self.gvk(), self.plural())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Kind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

// === impl ApPolicy, ApLogConf, ApUserSig ===

macro_rules! dynamic_resource {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            pub const KIND: Kind = $kind;

            pub fn into_inner(self) -> DynamicObject {
                self.0
            }
        }

        impl From<DynamicObject> for $ty {
            fn from(obj: DynamicObject) -> Self {
                Self(obj)
            }
        }

        impl Deref for $ty {
            type Target = DynamicObject;

            fn deref(&self) -> &DynamicObject {
                &self.0
            }
        }
    };
}

dynamic_resource!(ApPolicy, Kind::Policy);
dynamic_resource!(ApLogConf, Kind::LogConf);
dynamic_resource!(ApUserSig, Kind::UserSig);
