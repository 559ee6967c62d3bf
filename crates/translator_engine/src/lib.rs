//! Translator engine: HTTP client, background command execution and artifact IO.
mod client;
mod decode;
mod engine;
mod filename;
mod persist;
mod types;

pub use client::{ClientSettings, ReqwestApi, TranslationApi};
pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::{EngineError, EngineHandle};
pub use filename::artifact_filename;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use types::{ApiError, Download, DownloadError, EngineEvent, FailureKind};
