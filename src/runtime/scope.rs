use std::sync::Arc;

use parking_lot::RwLock;

use crate::lang::object::RModule;
use crate::lang::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Script,
    Module,
    Class,
    Method,
    Block,
    Eval,
}

/// Compile-time lexical scope: the variable names it declares, the module it
/// is nested in and the file it came from.
#[derive(Debug)]
pub struct StaticScope {
    kind: ScopeKind,
    file: Arc<str>,
    module: Option<Arc<RModule>>,
    variables: Vec<Arc<str>>,
    parent: Option<Arc<StaticScope>>,
}

impl StaticScope {
    pub fn new(kind: ScopeKind, file: &str, parent: Option<Arc<StaticScope>>) -> Self {
        StaticScope {
            kind,
            file: Arc::from(file),
            module: None,
            variables: Vec::new(),
            parent,
        }
    }

    pub fn with_module(mut self, module: Arc<RModule>) -> Self {
        self.module = Some(module);
        self
    }

    pub fn with_variables(mut self, names: &[&str]) -> Self {
        self.variables = names.iter().map(|name| Arc::from(*name)).collect();
        self
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn file(&self) -> &Arc<str> {
        &self.file
    }

    pub fn parent(&self) -> Option<&Arc<StaticScope>> {
        self.parent.as_ref()
    }

    pub fn variables(&self) -> &[Arc<str>] {
        &self.variables
    }

    pub fn variable_offset(&self, name: &str) -> Option<u32> {
        self.variables
            .iter()
            .position(|v| &**v == name)
            .map(|offset| offset as u32)
    }

    /// The scope `depth` lexical levels above `scope` (0 is `scope` itself).
    pub fn enclosing(scope: &Arc<StaticScope>, depth: u32) -> Option<Arc<StaticScope>> {
        let mut current = scope.clone();
        for _ in 0..depth {
            current = current.parent.clone()?;
        }
        Some(current)
    }

    /// Find `name` declared exactly `depth` levels up; returns its offset and
    /// the declaring scope.
    pub fn resolve_local(
        scope: &Arc<StaticScope>,
        name: &str,
        depth: u32,
    ) -> Option<(u32, Arc<StaticScope>)> {
        let defining = Self::enclosing(scope, depth)?;
        let offset = defining.variable_offset(name)?;
        Some((offset, defining))
    }

    /// Innermost lexical module, walking outward through blocks.
    pub fn lexical_module(&self) -> Option<Arc<RModule>> {
        match &self.module {
            Some(module) => Some(module.clone()),
            None => self.parent.as_ref().and_then(|p| p.lexical_module()),
        }
    }
}

/// Runtime storage for one activation of a static scope, chained to the
/// activation it is lexically nested in.
#[derive(Debug)]
pub struct DynamicScope {
    static_scope: Arc<StaticScope>,
    values: RwLock<Vec<Option<Value>>>,
    parent: Option<Arc<DynamicScope>>,
}

impl DynamicScope {
    pub fn new(static_scope: Arc<StaticScope>, parent: Option<Arc<DynamicScope>>) -> Self {
        let size = static_scope.variables().len();
        DynamicScope {
            static_scope,
            values: RwLock::new(vec![None; size]),
            parent,
        }
    }

    pub fn static_scope(&self) -> &Arc<StaticScope> {
        &self.static_scope
    }

    pub fn parent(&self) -> Option<&Arc<DynamicScope>> {
        self.parent.as_ref()
    }

    fn at_depth(&self, depth: u32) -> Option<&DynamicScope> {
        let mut current = self;
        for _ in 0..depth {
            current = current.parent.as_deref()?;
        }
        Some(current)
    }

    /// Unset or unreachable slots read as nil.
    pub fn get_value(&self, offset: u32, depth: u32) -> Value {
        self.at_depth(depth)
            .and_then(|scope| scope.values.read().get(offset as usize).cloned().flatten())
            .unwrap_or(Value::Nil)
    }

    /// Returns false when `depth` walks past the outermost scope.
    pub fn set_value(&self, offset: u32, depth: u32, value: Value) -> bool {
        let Some(scope) = self.at_depth(depth) else {
            return false;
        };
        let mut values = scope.values.write();
        let index = offset as usize;
        if index >= values.len() {
            values.resize(index + 1, None);
        }
        values[index] = Some(value);
        true
    }
}
