use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use super::scope::{DynamicScope, StaticScope};
use crate::config::IrConfig;
use crate::lang::object::{BuiltinClass, MatchData, RModule};
use crate::lang::string::{CodeRange, Encoding, RString};
use crate::lang::symbol::{Symbol, SymbolTable};
use crate::lang::value::Value;

/// Process-wide runtime state shared by every thread.
pub struct Runtime {
    config: IrConfig,
    symbols: SymbolTable,
    fstrings: Mutex<FxHashMap<(Vec<u8>, Encoding), Arc<RString>>>,
    builtins: FxHashMap<BuiltinClass, Arc<RModule>>,
    globals: RwLock<FxHashMap<String, Value>>,
}

impl Runtime {
    pub fn new() -> Arc<Self> {
        Self::with_config(IrConfig::default())
    }

    pub fn with_config(config: IrConfig) -> Arc<Self> {
        let builtins = BuiltinClass::ALL
            .iter()
            .map(|&class| (class, Arc::new(RModule::builtin(class))))
            .collect();
        Arc::new(Runtime {
            config,
            symbols: SymbolTable::new(),
            fstrings: Mutex::new(FxHashMap::default()),
            builtins,
            globals: RwLock::new(FxHashMap::default()),
        })
    }

    pub fn config(&self) -> &IrConfig {
        &self.config
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn intern(&self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    pub fn builtin(&self, class: BuiltinClass) -> Arc<RModule> {
        match self.builtins.get(&class) {
            Some(module) => module.clone(),
            None => Arc::new(RModule::builtin(class)),
        }
    }

    pub fn object_class(&self) -> Arc<RModule> {
        self.builtin(BuiltinClass::Object)
    }

    /// The shared frozen instance for these bytes, created on first request.
    pub fn freeze_and_dedup(
        &self,
        bytes: &[u8],
        encoding: Encoding,
        code_range: CodeRange,
    ) -> Arc<RString> {
        let mut table = self.fstrings.lock();
        if let Some(existing) = table.get(&(bytes.to_vec(), encoding)) {
            return existing.clone();
        }
        let fstring = Arc::new(RString::new_frozen(bytes.to_vec(), encoding, code_range));
        table.insert((bytes.to_vec(), encoding), fstring.clone());
        fstring
    }

    pub fn global(&self, name: &str) -> Value {
        self.globals.read().get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_global(&self, name: &str, value: Value) {
        self.globals.write().insert(name.to_string(), value);
    }
}

/// Per-thread interpreter state.
pub struct ThreadContext {
    runtime: Arc<Runtime>,
    backref: RwLock<Option<Arc<MatchData>>>,
}

impl ThreadContext {
    pub fn new(runtime: Arc<Runtime>) -> Self {
        ThreadContext {
            runtime,
            backref: RwLock::new(None),
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn config(&self) -> &IrConfig {
        self.runtime.config()
    }

    /// Last successful match (`$~`).
    pub fn backref(&self) -> Option<Arc<MatchData>> {
        self.backref.read().clone()
    }

    pub fn set_backref(&self, backref: Option<MatchData>) {
        *self.backref.write() = backref.map(Arc::new);
    }
}

/// Interpreter-private temporary slots of one activation. Fixnum, float and
/// boolean temporaries live in their own unboxed arrays.
#[derive(Debug, Default, Clone)]
pub struct TempSlots {
    objects: Vec<Option<Value>>,
    fixnums: Vec<Option<i64>>,
    floats: Vec<Option<f64>>,
    booleans: Vec<Option<bool>>,
}

fn slot<T: Clone>(slots: &[Option<T>], offset: u32) -> Option<T> {
    slots.get(offset as usize).cloned().flatten()
}

fn store<T>(slots: &mut Vec<Option<T>>, offset: u32, value: T) {
    let index = offset as usize;
    if index >= slots.len() {
        slots.resize_with(index + 1, || None);
    }
    slots[index] = Some(value);
}

impl TempSlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, offset: u32) -> Option<Value> {
        slot(&self.objects, offset)
    }

    pub fn set(&mut self, offset: u32, value: Value) {
        store(&mut self.objects, offset, value);
    }

    pub fn get_fixnum(&self, offset: u32) -> Option<i64> {
        slot(&self.fixnums, offset)
    }

    pub fn set_fixnum(&mut self, offset: u32, value: i64) {
        store(&mut self.fixnums, offset, value);
    }

    pub fn get_float(&self, offset: u32) -> Option<f64> {
        slot(&self.floats, offset)
    }

    pub fn set_float(&mut self, offset: u32, value: f64) {
        store(&mut self.floats, offset, value);
    }

    pub fn get_boolean(&self, offset: u32) -> Option<bool> {
        slot(&self.booleans, offset)
    }

    pub fn set_boolean(&mut self, offset: u32, value: bool) {
        store(&mut self.booleans, offset, value);
    }
}

/// Everything `retrieve` may consult.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub context: &'a ThreadContext,
    pub self_value: &'a Value,
    pub static_scope: &'a Arc<StaticScope>,
    pub dynamic_scope: &'a DynamicScope,
    pub temps: &'a TempSlots,
}

impl<'a> Frame<'a> {
    pub fn new(
        context: &'a ThreadContext,
        self_value: &'a Value,
        static_scope: &'a Arc<StaticScope>,
        dynamic_scope: &'a DynamicScope,
        temps: &'a TempSlots,
    ) -> Self {
        Frame {
            context,
            self_value,
            static_scope,
            dynamic_scope,
            temps,
        }
    }

    pub fn runtime(&self) -> &'a Arc<Runtime> {
        self.context.runtime()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_and_dedup_shares_instance() {
        let runtime = Runtime::new();
        let a = runtime.freeze_and_dedup(b"abc", Encoding::Utf8, CodeRange::SevenBit);
        let b = runtime.freeze_and_dedup(b"abc", Encoding::Utf8, CodeRange::SevenBit);
        let c = runtime.freeze_and_dedup(b"abc", Encoding::Binary, CodeRange::SevenBit);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert!(a.is_frozen());
    }

    #[test]
    fn test_temp_slots_default_to_none() {
        let mut temps = TempSlots::new();
        assert!(temps.get(3).is_none());
        temps.set(3, Value::Fixnum(1));
        assert_eq!(temps.get(3), Some(Value::Fixnum(1)));
        temps.set_fixnum(1, 7);
        assert_eq!(temps.get_fixnum(1), Some(7));
        assert_eq!(temps.get_fixnum(0), None);
    }

    #[test]
    fn test_globals_default_nil() {
        let runtime = Runtime::new();
        assert_eq!(runtime.global("$foo"), Value::Nil);
        runtime.set_global("$foo", Value::Bool(true));
        assert_eq!(runtime.global("$foo"), Value::Bool(true));
    }

    #[test]
    fn test_backref_round_trip() {
        let context = ThreadContext::new(Runtime::new());
        assert!(context.backref().is_none());
        context.set_backref(Some(MatchData::new(b"ab".to_vec(), vec![Some((0, 2))])));
        assert_eq!(context.backref().unwrap().group(0), Some(&b"ab"[..]));
    }
}
