//! Status codes for navmesh queries

/// Result type for navmesh queries
pub type Result<T> = std::result::Result<T, Status>;

/// Status enum for navmesh queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Operation was successful
    Success,
    /// Operation failed due to an unknown reason
    Failure,
    /// Provided parameter was invalid (bad polygon or triangle id)
    InvalidParam,
    /// Corridor search exhausted the graph or hit its expansion cap
    PathNotFound,
    /// The funnel produced no usable corner
    CornerNotFound,
    /// Value does not exist or is not found
    NotFound,
    /// Operation stopped at a safety cap and returned what it had
    PartialResult,
    /// A fixed-capacity buffer was exceeded
    BufferTooSmall,
}

impl Status {
    /// Checks if the status is a failure
    pub fn is_failure(&self) -> bool {
        *self != Status::Success && *self != Status::PartialResult
    }

    /// Checks if the status is a success
    pub fn is_success(&self) -> bool {
        *self == Status::Success || *self == Status::PartialResult
    }

    /// Converts status to a result
    pub fn to_result<T>(self, value: T) -> Result<T> {
        if self.is_success() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl std::error::Error for Status {}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Success => write!(f, "Success"),
            Status::Failure => write!(f, "Failure"),
            Status::InvalidParam => write!(f, "Invalid parameter"),
            Status::PathNotFound => write!(f, "Path not found"),
            Status::CornerNotFound => write!(f, "Corner not found"),
            Status::NotFound => write!(f, "Value not found"),
            Status::PartialResult => write!(f, "Partial result"),
            Status::BufferTooSmall => write!(f, "Buffer too small"),
        }
    }
}

impl From<Status> for trinav_common::Error {
    fn from(status: Status) -> Self {
        use trinav_common::Error;
        match status {
            Status::PathNotFound => Error::Pathfinding(status.to_string()),
            Status::CornerNotFound => Error::CornerNotFound(status.to_string()),
            Status::BufferTooSmall => Error::CommandBuffer(status.to_string()),
            _ => Error::Navigation(status.to_string()),
        }
    }
}
