//! CLI error handling with user-friendly messages.

use std::fmt;
use std::path::PathBuf;
use std::process;

use tessera::config::ConfigFileError;
use tessera::coord::CoordError;
use tessera::filter::FilterError;
use tessera::mapconfig::MapConfigError;
use tessera::renderer::RenderError;
use tessera::TesseraError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to read an input file
    FileRead { path: PathBuf, error: std::io::Error },
    /// Input file is not valid JSON
    Json {
        path: PathBuf,
        error: serde_json::Error,
    },
    /// Library error
    Tessera(TesseraError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Tessera(TesseraError::Filter(_)) = self {
            eprintln!();
            eprintln!("Filter parameters look like:");
            eprintln!(r#"  {{"layers": [{{"<widget id>": {{"accept": ["value"]}}}}]}}"#);
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read '{}': {}", path.display(), error)
            }
            CliError::Json { path, error } => {
                write!(f, "Invalid JSON in '{}': {}", path.display(), error)
            }
            CliError::Tessera(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::FileRead { error, .. } => Some(error),
            CliError::Json { error, .. } => Some(error),
            CliError::Tessera(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TesseraError> for CliError {
    fn from(e: TesseraError) -> Self {
        CliError::Tessera(e)
    }
}

impl From<MapConfigError> for CliError {
    fn from(e: MapConfigError) -> Self {
        CliError::Tessera(e.into())
    }
}

impl From<FilterError> for CliError {
    fn from(e: FilterError) -> Self {
        CliError::Tessera(e.into())
    }
}

impl From<RenderError> for CliError {
    fn from(e: RenderError) -> Self {
        CliError::Tessera(e.into())
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Tessera(e.into())
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Tessera(e.into())
    }
}
