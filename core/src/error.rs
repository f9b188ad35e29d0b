use std::fmt;

/// Severity attached to every error surfaced by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level_str = match self {
            Level::Info => "INFO",
            Level::Warning => "WARNING",
            Level::Error => "ERROR",
            Level::Critical => "CRITICAL",
        };
        write!(f, "{}", level_str)
    }
}

/// Common reporting surface shared by the crate's error types.
pub trait LcmErrorExt {
    fn level(&self) -> Level;
    fn message(&self) -> String;
    fn issuer(&self) -> String;
}

impl fmt::Debug for dyn LcmErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LCM | {} | {} | {}", self.level(), self.issuer(), self.message())
    }
}

impl fmt::Display for dyn LcmErrorExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Outcome codes returned by registration and batch processing.
///
/// The first four engine codes keep the numeric values of the Lua status
/// codes they stand for; protocol codes start above them at `LCM_ERR + 1`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok = 0,
    /// Lua runtime error.
    RuntimeError = 2,
    /// Lua syntax error.
    SyntaxError = 3,
    /// Memory allocation failure.
    MemoryError = 4,
    /// Error raised while running the Lua error handler.
    ErrorInHandler = 5,
    /// Lua state never set up with [`crate::setup`].
    NotInitialized = LCM_ERR + 1,
    /// Lambda source ran without calling `lcm:register()`.
    NoRegistrationCall = LCM_ERR + 2,
    /// No lambda registered under the requested id.
    LambdaNotFound = LCM_ERR + 3,
    /// Lambda callback did not return a string.
    NoResult = LCM_ERR + 4,
}

const LCM_ERR: i32 = 5 + 100;

const UNKNOWN_ERROR: &str = "LCM: Unknown error.";

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::Ok,
        ErrorCode::RuntimeError,
        ErrorCode::SyntaxError,
        ErrorCode::MemoryError,
        ErrorCode::ErrorInHandler,
        ErrorCode::NotInitialized,
        ErrorCode::NoRegistrationCall,
        ErrorCode::LambdaNotFound,
        ErrorCode::NoResult,
    ];

    pub fn from_raw(raw: i32) -> Option<ErrorCode> {
        ErrorCode::ALL.into_iter().find(|code| code.as_raw() == raw)
    }

    pub fn as_raw(self) -> i32 {
        self as i32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "LCM: No error.",
            ErrorCode::RuntimeError => "LCM: Lua runtime error.",
            ErrorCode::SyntaxError => "LCM: Lua syntax error.",
            ErrorCode::MemoryError => "LCM: Memory allocation failure.",
            ErrorCode::ErrorInHandler => "LCM: Error in Lua error handler.",
            ErrorCode::NotInitialized => "LCM: Lua context not setup with LCM.",
            ErrorCode::NoRegistrationCall => "LCM: `lcm:register()` never called.",
            ErrorCode::LambdaNotFound => "LCM: Required lambda not available.",
            ErrorCode::NoResult => "LCM: No result produced.",
        }
    }

    /// True for codes raised by the script engine rather than by protocol checks.
    pub fn is_engine_fault(self) -> bool {
        matches!(
            self,
            ErrorCode::RuntimeError
                | ErrorCode::SyntaxError
                | ErrorCode::MemoryError
                | ErrorCode::ErrorInHandler
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a raw outcome code to its description. Never fails.
pub fn error_to_string(code: i32) -> &'static str {
    ErrorCode::from_raw(code).map_or(UNKNOWN_ERROR, ErrorCode::as_str)
}

/// Collapses an operation result into its outcome code.
pub fn status_code<T>(result: &Result<T>) -> ErrorCode {
    match result {
        Ok(_) => ErrorCode::Ok,
        Err(e) => e.code(),
    }
}

/// Failure of a registration or processing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    detail: Option<String>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(code: ErrorCode) -> Self {
        debug_assert!(code != ErrorCode::Ok, "Ok is not an error");
        Error { code, detail: None }
    }

    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        debug_assert!(code != ErrorCode::Ok, "Ok is not an error");
        Error {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Engine message or protocol context, when there is one.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.code, detail),
            None => write!(f, "{}", self.code),
        }
    }
}

impl std::error::Error for Error {}

impl LcmErrorExt for Error {
    fn level(&self) -> Level {
        match self.code {
            ErrorCode::Ok => Level::Info,
            ErrorCode::MemoryError | ErrorCode::ErrorInHandler | ErrorCode::NotInitialized => {
                Level::Critical
            }
            _ => Level::Error,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }

    fn issuer(&self) -> String {
        if self.code.is_engine_fault() {
            "lcm.engine".to_string()
        } else {
            "lcm.protocol".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_code_round_trips_through_raw() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_raw(code.as_raw()), Some(code));
        }
    }

    #[test]
    fn engine_codes_match_lua_status_values() {
        assert_eq!(ErrorCode::RuntimeError.as_raw(), 2);
        assert_eq!(ErrorCode::SyntaxError.as_raw(), 3);
        assert_eq!(ErrorCode::MemoryError.as_raw(), 4);
        assert_eq!(ErrorCode::ErrorInHandler.as_raw(), 5);
        assert_eq!(ErrorCode::NotInitialized.as_raw(), 106);
        assert_eq!(ErrorCode::NoResult.as_raw(), 109);
    }

    #[test]
    fn unknown_codes_map_to_generic_string() {
        assert_eq!(error_to_string(1), UNKNOWN_ERROR);
        assert_eq!(error_to_string(-7), UNKNOWN_ERROR);
        assert_eq!(error_to_string(i32::MAX), UNKNOWN_ERROR);
        assert_eq!(error_to_string(3), "LCM: Lua syntax error.");
        assert_eq!(
            error_to_string(ErrorCode::NoRegistrationCall.as_raw()),
            "LCM: `lcm:register()` never called."
        );
    }

    #[test]
    fn strings_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for code in ErrorCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate string for {:?}", code);
        }
        assert!(!seen.contains(UNKNOWN_ERROR));
    }

    #[test]
    fn display_includes_detail() {
        let e = Error::with_detail(ErrorCode::NoResult, "lambda returned number");
        assert_eq!(e.to_string(), "LCM: No result produced. (lambda returned number)");
        assert_eq!(Error::new(ErrorCode::LambdaNotFound).to_string(), "LCM: Required lambda not available.");
    }

    #[test]
    fn issuer_separates_engine_from_protocol() {
        assert_eq!(Error::new(ErrorCode::SyntaxError).issuer(), "lcm.engine");
        assert_eq!(Error::new(ErrorCode::LambdaNotFound).issuer(), "lcm.protocol");
        assert_eq!(Error::new(ErrorCode::NotInitialized).level(), Level::Critical);
    }

    #[test]
    fn status_code_collapses_results() {
        let ok: Result<()> = Ok(());
        let err: Result<()> = Err(Error::new(ErrorCode::NoResult));
        assert_eq!(status_code(&ok), ErrorCode::Ok);
        assert_eq!(status_code(&err), ErrorCode::NoResult);
    }
}
