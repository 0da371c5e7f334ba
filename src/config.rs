use serde::{Deserialize, Serialize};

/// How chilled string literals behave when evaluated and later mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChilledStringMode {
    /// Mutation succeeds but emits a deprecation warning the first time.
    #[default]
    Warn,
    /// Chilled literals behave exactly like ordinary mutable literals.
    Mutable,
    /// Chilled literals are already frozen; mutation raises FrozenError.
    Frozen,
}

/// Runtime knobs consulted while operands are evaluated or decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrConfig {
    pub chilled_strings: ChilledStringMode,
    /// Give every frozen string literal its own object tagged with the
    /// creation site instead of sharing the deduplicated instance.
    pub debug_frozen_string_literals: bool,
    /// Largest `$n` group index accepted when decoding an NthRef.
    pub max_nth_ref: u32,
    /// Deepest operand nesting accepted when decoding.
    pub max_operand_depth: u32,
}

impl Default for IrConfig {
    fn default() -> Self {
        IrConfig {
            chilled_strings: ChilledStringMode::Warn,
            debug_frozen_string_literals: false,
            max_nth_ref: 1 << 20,
            max_operand_depth: 128,
        }
    }
}

impl IrConfig {
    pub fn with_chilled_strings(mut self, mode: ChilledStringMode) -> Self {
        self.chilled_strings = mode;
        self
    }

    pub fn with_debug_frozen_string_literals(mut self, enabled: bool) -> Self {
        self.debug_frozen_string_literals = enabled;
        self
    }
}
