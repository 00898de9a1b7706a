use std::fmt;

/// Errors raised by the extension registry.
///
/// Descriptor parsing problems (an unreadable line, a token nobody
/// registered) are collected into [`ExtensionError::NotFound`]'s `causes`
/// rather than raised individually — a single bad line in one descriptor
/// file must not prevent every other line from loading. Only conflicts that
/// make the registry's own state ambiguous (two classes both claiming to be
/// *the* adaptive implementation, two different tokens claiming the same
/// name) are fatal.
#[derive(Debug, Clone)]
pub enum ExtensionError {
    /// No implementation is registered under `name`, or `name` resolved to a
    /// class token that isn't classified as an ordinary implementation.
    NotFound {
        point: &'static str,
        name: String,
        causes: Vec<String>,
    },
    /// Two class tokens were both classified `Adaptive` for the same
    /// extension point.
    DuplicateAdaptive {
        point: &'static str,
        first: String,
        second: String,
    },
    /// Two descriptor entries mapped the same name to different class tokens.
    DuplicateName {
        point: &'static str,
        name: String,
        first: String,
        second: String,
    },
    /// An adaptive dispatcher could not determine which implementation to
    /// call: the key walk ran out of keys without finding a usable parameter
    /// and no extension-point default name exists.
    SynthesisFailure { point: &'static str, reason: String },
    /// A caller passed a malformed argument (e.g. an invocation with no
    /// method name where one was required).
    IllegalArgument(String),
    /// The registry was asked to do something its current state can't
    /// support (e.g. `get_adaptive` called before any loader ran and no
    /// adaptive class is registered).
    IllegalState(String),
    /// An adaptive dispatcher was invoked for a method its interface marks
    /// non-adaptive. Only the methods named in an extension point's
    /// `adaptive()` contract may be dispatched by key; everything else
    /// raises this instead of silently resolving some default.
    UnsupportedOperation { point: &'static str, method: &'static str },
}

impl fmt::Display for ExtensionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtensionError::NotFound { point, name, causes } => {
                write!(f, "no extension named '{name}' for point '{point}'")?;
                if !causes.is_empty() {
                    write!(f, " ({})", causes.join("; "))?;
                }
                Ok(())
            }
            ExtensionError::DuplicateAdaptive { point, first, second } => write!(
                f,
                "point '{point}' has more than one adaptive class: '{first}' and '{second}'"
            ),
            ExtensionError::DuplicateName { point, name, first, second } => write!(
                f,
                "point '{point}' name '{name}' maps to both '{first}' and '{second}'"
            ),
            ExtensionError::SynthesisFailure { point, reason } => {
                write!(f, "adaptive dispatch failed for point '{point}': {reason}")
            }
            ExtensionError::IllegalArgument(msg) => write!(f, "illegal argument: {msg}"),
            ExtensionError::IllegalState(msg) => write!(f, "illegal state: {msg}"),
            ExtensionError::UnsupportedOperation { point, method } => {
                write!(f, "method '{method}' on point '{point}' is not adaptive")
            }
        }
    }
}

impl std::error::Error for ExtensionError {}
