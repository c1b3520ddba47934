//! Structural validation of App Protect resources.
//!
//! Validation only checks that the fields the controller relies on are present and have the
//! expected shape. The content of a policy or signature is not interpreted here.

use crate::appprotect::Kind;
use kube::{core::DynamicObject, ResourceExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::net::IpAddr;
use thiserror::Error;

/// Checks a raw resource before it is indexed.
pub trait Validate {
    fn validate(&self, kind: Kind, obj: &DynamicObject) -> Result<(), ValidationError>;
}

/// Requires the fields each kind is expected to carry.
#[derive(Copy, Clone, Debug, Default)]
pub struct RequiredFields;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Error validating App Protect {} {name}: Required field {path} not found", .kind.description())]
    MissingField {
        kind: Kind,
        name: String,
        path: String,
    },

    #[error("Error validating App Protect {} {name}: Field {path} has unexpected type", .kind.description())]
    UnexpectedType {
        kind: Kind,
        name: String,
        path: String,
    },
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LogDestinationError {
    #[error(
        "Error parsing App Protect Log config: Destination must follow format: \
         syslog:server=<ip-address | localhost>:<port> or fqdn or stderr or absolute path to file \
         Log Destination did not follow format"
    )]
    InvalidFormat,

    #[error("Error parsing port: {0} not a valid port number")]
    InvalidPort(String),

    #[error("Error parsing host: {0} is not a valid ip address or host name")]
    InvalidHost(String),
}

#[derive(Copy, Clone, Debug)]
enum Shape {
    Map,
    List,
}

const POLICY_REQUIRED: &[(&[&str], Shape)] = &[(&["spec", "policy"], Shape::Map)];

const LOG_CONF_REQUIRED: &[(&[&str], Shape)] = &[
    (&["spec", "content"], Shape::Map),
    (&["spec", "filter"], Shape::Map),
];

const USER_SIG_REQUIRED: &[(&[&str], Shape)] = &[(&["spec", "signatures"], Shape::List)];

static LOG_DESTINATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:syslog:server=((?:\d{1,3}\.){3}\d{1,3}|localhost|[a-zA-Z0-9._-]+):\d{1,5})|stderr|(?:/[\S]+)+",
    )
    .expect("log destination regex must compile")
});

static LOG_DESTINATION_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:/[\S]+)+").expect("log file regex must compile"));

static LOG_DESTINATION_FQDN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[a-zA-Z0-9_-]+\.)+[a-zA-Z0-9_-]+").expect("fqdn regex must compile")
});

// === impl RequiredFields ===

impl Validate for RequiredFields {
    fn validate(&self, kind: Kind, obj: &DynamicObject) -> Result<(), ValidationError> {
        let required = match kind {
            Kind::Policy => POLICY_REQUIRED,
            Kind::LogConf => LOG_CONF_REQUIRED,
            Kind::UserSig => USER_SIG_REQUIRED,
        };

        for (path, shape) in required {
            let render = || path.join(".");
            match (nested(&obj.data, path), shape) {
                (None | Some(Value::Null), _) => {
                    return Err(ValidationError::MissingField {
                        kind,
                        name: obj.name_any(),
                        path: render(),
                    })
                }
                (Some(Value::Object(_)), Shape::Map) | (Some(Value::Array(_)), Shape::List) => {}
                (Some(_), _) => {
                    return Err(ValidationError::UnexpectedType {
                        kind,
                        name: obj.name_any(),
                        path: render(),
                    })
                }
            }
        }

        Ok(())
    }
}

/// Looks up a nested field of a resource's untyped payload.
pub fn nested<'v>(value: &'v Value, path: &[&str]) -> Option<&'v Value> {
    path.iter()
        .try_fold(value, |value, field| value.as_object()?.get(*field))
}

/// Validates the destination of an App Protect log configuration. Accepts `stderr`, an
/// absolute file path, or `syslog:server=<host>:<port>`.
pub fn validate_log_destination(dst: &str) -> Result<(), LogDestinationError> {
    if !LOG_DESTINATION.is_match(dst) {
        return Err(LogDestinationError::InvalidFormat);
    }

    if dst == "stderr" || LOG_DESTINATION_FILE.is_match(dst) {
        return Ok(());
    }

    let mut chunks = dst.split(':');
    let (Some(_), Some(server), Some(port)) = (chunks.next(), chunks.next(), chunks.next()) else {
        return Err(LogDestinationError::InvalidFormat);
    };

    match port.parse::<u32>() {
        Ok(p) if (1..=65535).contains(&p) => {}
        _ => return Err(LogDestinationError::InvalidPort(port.to_string())),
    }

    let Some((_, host)) = server.split_once('=') else {
        return Err(LogDestinationError::InvalidFormat);
    };

    if host == "localhost" || LOG_DESTINATION_FQDN.is_match(host) || host.parse::<IpAddr>().is_ok()
    {
        return Ok(());
    }

    Err(LogDestinationError::InvalidHost(host.to_string()))
}
