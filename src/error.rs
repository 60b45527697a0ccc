// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// Errors raised while evaluating a launch configuration.
///
/// None of these are caught internally: the first error aborts the
/// evaluation, leaving earlier mutations and started instances as they are.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `$name` reference that is not present in the active scope.
    #[error("undefined constant `{name}`")]
    UndefinedConstant { name: String },

    /// A local constant definition requested an evaluator that does not exist.
    #[error("unknown local constant type `{kind}`")]
    UnknownLocalConstantType { kind: String },

    /// A local constant definition whose options are unusable.
    #[error("local constant `{name}`: {reason}")]
    InvalidLocalConstant { name: String, reason: String },

    #[error("invalid containers specification: {reason}")]
    InvalidContainersSpec { reason: String },

    /// A read through a path segment that does not exist.
    #[error("cannot resolve `{segment}` in path `{path}`")]
    PathResolution { path: String, segment: String },

    /// A write that cannot be performed, e.g. through a scalar.
    #[error("cannot write to path `{path}`: {reason}")]
    InvalidPathTarget { path: String, reason: String },

    #[error("invalid rules: {reason}")]
    InvalidRules { reason: String },

    #[error("invalid hooks: {reason}")]
    InvalidHooks { reason: String },

    /// A lazy constant that keeps expanding into itself.
    #[error("lazy constant `{name}` exceeded the expansion depth limit")]
    LazyRecursionLimit { name: String },

    #[error("hook `{phase}` failed running `{command}`: {status}")]
    HookFailed {
        phase: String,
        command: String,
        status: String,
    },

    #[error("could not run `{command}`: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("backend failed for {descriptor}: {message}")]
    Backend { descriptor: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = core::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Config {
            message: format!("{error}"),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(error: anyhow::Error) -> Self {
        Error::Config {
            message: format!("{error}"),
        }
    }
}
