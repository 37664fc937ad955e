//! Alert sound sources.
//!
//! A source is an opaque asset reference: the built-in alert tone or an
//! audio file on disk. The engine never looks inside it.

use std::path::{Path, PathBuf};

use super::error::SoundError;

/// Name of the built-in alert tone.
pub const BUILTIN_TONE_NAME: &str = "alarm";

/// Supported audio file extensions.
const SUPPORTED_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg", "flac"];

/// The sound an alert plays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundSource {
    /// The synthesized alert tone.
    BuiltIn {
        /// The name of the tone.
        name: String,
    },
    /// An audio file on disk.
    File {
        /// Display name (the file stem).
        name: String,
        /// Path to the file.
        path: PathBuf,
    },
}

impl Default for SoundSource {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SoundSource {
    /// The built-in alert tone.
    #[must_use]
    pub fn builtin() -> Self {
        Self::BuiltIn {
            name: BUILTIN_TONE_NAME.to_string(),
        }
    }

    /// An audio file, named after its stem. The path is not checked.
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::File { name, path }
    }

    /// An audio file that exists and has a supported extension.
    ///
    /// # Errors
    ///
    /// Returns `SoundError::FileNotFound` if the path is not a file and
    /// `SoundError::UnsupportedFormat` if the extension is not supported.
    pub fn file_validated(path: impl Into<PathBuf>) -> Result<Self, SoundError> {
        let path = path.into();
        if !path.is_file() {
            return Err(SoundError::FileNotFound(path.display().to_string()));
        }
        if !is_supported_format(&path) {
            return Err(SoundError::UnsupportedFormat(path.display().to_string()));
        }
        Ok(Self::file(path))
    }

    /// Returns the name of the sound source.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::BuiltIn { name } | Self::File { name, .. } => name,
        }
    }

    /// Returns true if this is the built-in tone.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltIn { .. })
    }

    /// Returns the file path if this is a file source.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File { path, .. } => Some(path),
            Self::BuiltIn { .. } => None,
        }
    }
}

/// Returns true if the file extension is a supported audio format.
pub fn is_supported_format(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}
