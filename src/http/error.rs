use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;

/// Every way a single exchange can fail.
///
/// The `Display` form is the stable uppercase name used in logs;
/// [`ClientError::description`] is the text shown to clients in `400` bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientError {
    CheckFileLocationFailed,
    OutsideRootDirectory,
    EmptyMethod,
    FailedReadHeaderFieldGeneric,
    FailedReadHeaderFieldName,
    FailedReadHeaderFieldValue,
    FailedReadHeaderNewline,
    FailedReadMethod,
    FailedReadPath,
    FailedReadCrlf,
    FailedReadVersion,
    FailedWriteResponseBody,
    FailedWriteResponseMetadata,
    FileNotFound,
    IncorrectHeaderFieldName,
    IncorrectHeaderFieldNewline,
    IncorrectHeaderFieldValue,
    IncorrectMethod,
    IncorrectPath,
    IncorrectCrlf,
    IncorrectVersion,
    InvalidPathEmpty,
    InvalidPathNotAbsolute,
    InvalidPathMultipleQuestionMarks,
    MethodTooLong,
    TooManyRequestsPerThisConnection,
    UnexpectedCrInFieldName,
    UpgradeToHttps,
}

impl ClientError {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CheckFileLocationFailed => "CHECK_FILE_LOCATION_VERIFICATION_FAILURE",
            Self::OutsideRootDirectory => "CHECK_FILE_LOCATION_OUTSIDE_ROOT_DIRECTORY",
            Self::EmptyMethod => "EMPTY_METHOD",
            Self::FailedReadHeaderFieldGeneric => "FAILED_READ_HEADER_FIELD_GENERIC",
            Self::FailedReadHeaderFieldName => "FAILED_READ_HEADER_FIELD_NAME",
            Self::FailedReadHeaderFieldValue => "FAILED_READ_HEADER_FIELD_VALUE",
            Self::FailedReadHeaderNewline => "FAILED_READ_HEADER_NEWLINE",
            Self::FailedReadMethod => "FAILED_READ_METHOD",
            Self::FailedReadPath => "FAILED_READ_PATH",
            Self::FailedReadCrlf => "FAILED_READ_CRLF",
            Self::FailedReadVersion => "FAILED_READ_VERSION",
            Self::FailedWriteResponseBody => "FAILED_WRITE_RESPONSE_BODY",
            Self::FailedWriteResponseMetadata => "FAILED_WRITE_RESPONSE_METADATA",
            Self::FileNotFound => "FILE_NOT_FOUND",
            Self::IncorrectHeaderFieldName => "INCORRECT_HEADER_FIELD_NAME",
            Self::IncorrectHeaderFieldNewline => "INCORRECT_HEADER_FIELD_NEWLINE",
            Self::IncorrectHeaderFieldValue => "INCORRECT_HEADER_FIELD_VALUE",
            Self::IncorrectMethod => "INCORRECT_METHOD",
            Self::IncorrectPath => "INCORRECT_PATH",
            Self::IncorrectCrlf => "INCORRECT_CRLF",
            Self::IncorrectVersion => "INCORRECT_VERSION",
            Self::InvalidPathEmpty => "INVALID_PATH_EMPTY",
            Self::InvalidPathNotAbsolute => "INVALID_PATH_NOT_ABSOLUTE",
            Self::InvalidPathMultipleQuestionMarks => "INVALID_PATH_MULTIPLE_QUESTION_MARKS",
            Self::MethodTooLong => "POLICY_TOO_LONG_METHOD",
            Self::TooManyRequestsPerThisConnection => "TOO_MANY_REQUESTS_PER_THIS_CONNECTION",
            Self::UnexpectedCrInFieldName => "UNEXPECTED_CR_IN_FIELD_NAME",
            Self::UpgradeToHttps => "UPGRADE_TO_HTTPS",
        }
    }

    /// Human-readable diagnostic, used as the body of `400` responses.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CheckFileLocationFailed => "could not verify the location of the file",
            Self::OutsideRootDirectory => "file lies outside the root directory",
            Self::EmptyMethod => "method was empty",
            Self::FailedReadHeaderFieldGeneric => "failed to read header field",
            Self::FailedReadHeaderFieldName => "failed to read header field-name",
            Self::FailedReadHeaderFieldValue => "failed to read header field-value",
            Self::FailedReadHeaderNewline => "failed to read newline after header field",
            Self::FailedReadMethod => "failed to read method",
            Self::FailedReadPath => "failed to read request-target",
            Self::FailedReadCrlf => "failed to read newline after request-line",
            Self::FailedReadVersion => "failed to read HTTP version",
            Self::FailedWriteResponseBody => "failed to write response body",
            Self::FailedWriteResponseMetadata => "failed to write response metadata",
            Self::FileNotFound => "file not found",
            Self::IncorrectHeaderFieldName => "invalid header field-name",
            Self::IncorrectHeaderFieldNewline => "expected newline (CRLF) after header field",
            Self::IncorrectHeaderFieldValue => "invalid header field-value",
            Self::IncorrectMethod => "invalid method: not a token as per RFC 7230 section 3.2.6",
            Self::IncorrectPath => "incorrect request-target",
            Self::IncorrectCrlf => "request-line should end with a newline (CRLF)",
            Self::IncorrectVersion => "invalid HTTP version as per RFC 7230 section 2.6",
            Self::InvalidPathEmpty => "request-target was empty",
            Self::InvalidPathNotAbsolute => "only absolute-path request-target supported",
            Self::InvalidPathMultipleQuestionMarks => "request-target contains multiple '?' characters",
            Self::MethodTooLong => "method exceeds the maximum length allowed by policy",
            Self::TooManyRequestsPerThisConnection => "too many requests on this connection",
            Self::UnexpectedCrInFieldName => "unexpected CR in header field-name",
            Self::UpgradeToHttps => "this server only redirects to HTTPS",
        }
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Error for ClientError {}

/// Failure to bring a listening socket up.
#[derive(Debug)]
pub enum ServerLaunchError {
    SocketCreation(io::Error),
    SocketReusable(io::Error),
    SocketBind(io::Error),
    SocketListen(io::Error),
    NotInitialized,
}

impl Display for ServerLaunchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SocketCreation(e) => write!(f, "SOCKET_CREATION: {e}"),
            Self::SocketReusable(e) => write!(f, "SOCKET_REUSABLE: {e}"),
            Self::SocketBind(e) => write!(f, "SOCKET_BIND: {e}"),
            Self::SocketListen(e) => write!(f, "SOCKET_LISTEN: {e}"),
            Self::NotInitialized => write!(f, "NOT_INITIALIZED: initialize() was not called"),
        }
    }
}

impl Error for ServerLaunchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SocketCreation(e)
            | Self::SocketReusable(e)
            | Self::SocketBind(e)
            | Self::SocketListen(e) => Some(e),
            Self::NotInitialized => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_stable_name() {
        assert_eq!(ClientError::EmptyMethod.to_string(), "EMPTY_METHOD");
        assert_eq!(
            ClientError::InvalidPathMultipleQuestionMarks.to_string(),
            "INVALID_PATH_MULTIPLE_QUESTION_MARKS"
        );
    }

    #[test]
    fn launch_error_keeps_io_source() {
        let err = ServerLaunchError::SocketBind(io::Error::from(io::ErrorKind::AddrInUse));
        assert!(err.to_string().starts_with("SOCKET_BIND"));
        assert!(err.source().is_some());
        assert!(ServerLaunchError::NotInitialized.source().is_none());
    }
}
