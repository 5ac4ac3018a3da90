//! Effect trait definition
//!
//! Base trait for every node in a voice chain. Effects process fixed-size
//! mono blocks in place and must not allocate inside `process`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parameters common to all effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParams {
    /// Unique identifier for this effect instance
    pub id: String,
    /// Whether the effect is enabled
    pub enabled: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
        }
    }
}

/// Base trait for all DSP effects
pub trait Effect: Send {
    /// Process a mono block in place; output length equals input length
    fn process(&mut self, block: &mut [f32]);

    /// Prepare the effect for processing
    ///
    /// Called when sample rate or block size changes. This is the only place
    /// an effect may (re)allocate its working buffers.
    fn prepare(&mut self, sample_rate: u32, max_block_size: usize);

    /// Clear internal state (filter history, delay lines, oscillator phase)
    fn reset(&mut self);

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Get human-readable display name
    fn display_name(&self) -> &str;

    /// Get the unique instance ID
    fn id(&self) -> &str;

    /// Set the unique instance ID
    fn set_id(&mut self, id: String);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Enable or disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Get all parameters as JSON (diagnostics and chain manifests)
    fn get_params(&self) -> Value;
}

/// Helper macro to implement common Effect trait methods
#[macro_export]
macro_rules! impl_effect_common {
    ($type:ty, $effect_type:expr, $display_name:expr) => {
        fn effect_type(&self) -> &'static str {
            $effect_type
        }

        fn display_name(&self) -> &str {
            $display_name
        }

        fn id(&self) -> &str {
            &self.params.id
        }

        fn set_id(&mut self, id: String) {
            self.params.id = id;
        }

        fn is_enabled(&self) -> bool {
            self.params.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.params.enabled = enabled;
        }
    };
}
