// https://webidl.spec.whatwg.org/#idl-DOMException
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub struct DomException {
    pub name: ErrorName,
    pub message: &'static str,
    pub code: u16,
}

impl DomException {
    fn new(name: ErrorName, message: &'static str, code: u16) -> Self {
        Self {
            name,
            message,
            code,
        }
    }

    /// The two failures a not-yet-loaded resource may raise when it is probed.
    pub fn is_access_failure(&self) -> bool {
        matches!(
            self.name,
            ErrorName::SecurityError | ErrorName::InvalidAccessError
        )
    }
}

impl From<ErrorName> for DomException {
    fn from(value: ErrorName) -> Self {
        match value {
            ErrorName::HierarchyRequestError => DomException::new(
                value,
                "The operation would yield an incorrect node tree.",
                DomException::HIERARCHY_REQUEST_ERR,
            ),
            ErrorName::InvalidCharacterError => DomException::new(
                value,
                "The string contains invalid characters.",
                DomException::INVALID_CHARACTER_ERR,
            ),
            ErrorName::NotFoundError => DomException::new(
                value,
                "The object can not be found here.",
                DomException::NOT_FOUND_ERR,
            ),
            ErrorName::NotSupportedError => DomException::new(
                value,
                "The operation is not supported.",
                DomException::NOT_SUPPORTED_ERR,
            ),
            ErrorName::InvalidStateError => DomException::new(
                value,
                "The object is in an invalid state.",
                DomException::INVALID_STATE_ERR,
            ),
            ErrorName::InvalidAccessError => DomException::new(
                value,
                "The object does not support the operation or argument.",
                DomException::INVALID_ACCESS_ERR,
            ),
            ErrorName::SecurityError => DomException::new(
                value,
                "The operation is insecure.",
                DomException::SECURITY_ERR,
            ),
            ErrorName::NetworkError => DomException::new(
                value,
                "A network error occurred.",
                DomException::NETWORK_ERR,
            ),
        }
    }
}

impl DomException {
    pub const HIERARCHY_REQUEST_ERR: u16 = 3;
    pub const INVALID_CHARACTER_ERR: u16 = 5;
    pub const NOT_FOUND_ERR: u16 = 8;
    pub const NOT_SUPPORTED_ERR: u16 = 9;
    pub const INVALID_STATE_ERR: u16 = 11;
    pub const INVALID_ACCESS_ERR: u16 = 15;
    pub const SECURITY_ERR: u16 = 18;
    pub const NETWORK_ERR: u16 = 19;
}

impl std::fmt::Display for DomException {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.name, self.message)
    }
}

impl std::error::Error for DomException {}

// https://webidl.spec.whatwg.org/#dfn-error-names-table
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub enum ErrorName {
    HierarchyRequestError,
    InvalidCharacterError,
    NotFoundError,
    NotSupportedError,
    InvalidStateError,
    InvalidAccessError,
    SecurityError,
    NetworkError,
}
