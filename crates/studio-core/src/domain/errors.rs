use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StudioResult<T> = Result<T, StudioError>;
pub type CoreResult<T> = StudioResult<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StudioErrorCategory {
    Parse,
    NotFound,
    Geometry,
    UploadValidation,
    Simulation,
    Filesystem,
    Internal,
}

impl StudioErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Parse => 2,
            Self::NotFound => 3,
            Self::Geometry => 4,
            Self::UploadValidation => 5,
            Self::Simulation => 6,
            Self::Filesystem => 7,
            Self::Internal => 8,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Parse => "ParseError",
            Self::NotFound => "NotFoundError",
            Self::Geometry => "GeometryError",
            Self::UploadValidation => "UploadValidationError",
            Self::Simulation => "SimulationError",
            Self::Filesystem => "FilesystemError",
            Self::Internal => "InternalError",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioError {
    category: StudioErrorCategory,
    code: &'static str,
    message: String,
}

impl StudioError {
    pub fn new(
        category: StudioErrorCategory,
        code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code,
            message: message.into(),
        }
    }

    pub fn parse(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::Parse, code, message)
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::NotFound, code, message)
    }

    pub fn geometry(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::Geometry, code, message)
    }

    pub fn upload_validation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::UploadValidation, code, message)
    }

    pub fn simulation(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::Simulation, code, message)
    }

    pub fn filesystem(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::Filesystem, code, message)
    }

    pub fn internal(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StudioErrorCategory::Internal, code, message)
    }

    pub const fn category(&self) -> StudioErrorCategory {
        self.category
    }

    pub const fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.code, self.message)
    }

    pub fn fatal_exit_line(&self) -> String {
        format!("FATAL EXIT CODE: {}", self.exit_code())
    }
}

impl Display for StudioError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {}",
            self.category.label(),
            self.code,
            self.message
        )
    }
}

impl Error for StudioError {}
