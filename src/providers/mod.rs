/*!
 * Back-end seam for translation providers.
 *
 * This module defines the interface the orchestration layer calls into.
 * The actual network clients live in the embedding application; the
 * orchestrator treats them as opaque and untrusted for latency and
 * availability.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation back-ends
///
/// A back-end always supports single-text translation. Native batch
/// translation is optional: the orchestrator only invokes
/// [`translate_batch`](TranslationBackend::translate_batch) when the
/// provider's registry profile carries `supports_native_batch = true`,
/// so the default implementation simply rejects the call.
#[async_trait]
pub trait TranslationBackend: Send + Sync + Debug {
    /// Stable provider id, matching the registry profile key
    fn id(&self) -> &str;

    /// Translate a single text
    ///
    /// # Arguments
    /// * `text` - The text to translate
    /// * `source_language` - Source language code
    /// * `target_language` - Target language code
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or an error
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;

    /// Translate several texts joined by `delimiter` in one call,
    /// returning the combined translated string
    ///
    /// Only called for providers whose profile advertises native batch
    /// support. Absence of the capability is a data fact carried by the
    /// registry, not a runtime type probe.
    async fn translate_batch(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
        delimiter: &str,
    ) -> Result<String, ProviderError> {
        let _ = (texts, source_language, target_language, delimiter);
        Err(ProviderError::BatchUnsupported(self.id().to_string()))
    }
}

pub mod registry;
