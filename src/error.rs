use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program file not found: {}", path.display())]
    ProgramNotFound { path: PathBuf },

    #[error("failed to read program file {}", path.display())]
    ProgramRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
