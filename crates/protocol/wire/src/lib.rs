//! Wire encodings for the canonical interaction protocol.
//!
//! Each front-end speaks exactly one [`WireEncoding`]: the chat bot exchanges
//! JSON text frames, the mobile gateway exchanges compact binary frames. A
//! [`Translator`] converts one canonical packet type to and from one encoding,
//! and the [`TranslatorRegistry`] looks translators up by
//! (packet name, encoding). The registry is validated at start-up so a
//! missing translator is a configuration error, never a runtime surprise.
pub mod encoding;
pub mod error;
pub mod frame;
pub mod registry;
pub mod translator;

pub use encoding::{WireEncoding, WireMessage};
pub use error::{ConfigError, WireError};
pub use frame::{FRAME_VERSION, WireBody};
pub use registry::TranslatorRegistry;
pub use translator::{BinaryTranslator, JsonTranslator, Translator};
