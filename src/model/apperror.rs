use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    /**
     * Failure while setting up the process, e.g. unreadable config or
     * unreachable database. Always fatal for the surrounding run.
     */
    Initialization,
    /**
     * A referenced entity was absent. Recoverable at row/request level.
     */
    NotFound,
    /**
     * A required field was missing or malformed in a source row or request.
     */
    Validation,
    /**
     * An input file could not be read or decoded.
     */
    Parse,
    /**
     * The backing store rejected an operation.
     */
    DatabaseError,
    /**
     * A unique or foreign key constraint was violated.
     */
    ConstraintViolation,
    /**
     * Internal application error.
     */
    Application,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message }
    }

    /**
     * True when the error only invalidates a single row and the surrounding
     * batch loop may continue.
     */
    pub fn is_row_level(&self) -> bool {
        matches!(self.error_type, ErrorType::NotFound | ErrorType::Validation | ErrorType::ConstraintViolation)
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_row_level_errors() {
        assert!(ApplicationError::new(ErrorType::NotFound, "missing".to_string()).is_row_level());
        assert!(ApplicationError::new(ErrorType::Validation, "bad row".to_string()).is_row_level());
        assert!(!ApplicationError::new(ErrorType::Initialization, "no db".to_string()).is_row_level());
        assert!(!ApplicationError::new(ErrorType::DatabaseError, "io".to_string()).is_row_level());
    }
}
