//! Operands that name something in the evaluation environment rather than
//! holding a value: enclosing scopes, regexp match state, globals, labels and
//! a handful of payload-free markers.

use std::fmt;
use std::sync::Arc;

use super::variable::DepthCloneable;
use crate::lang::object::BuiltinClass;
use crate::lang::string::{CodeRange, Encoding, RString};
use crate::lang::value::Value;
use crate::runtime::context::Frame;
use crate::runtime::scope::StaticScope;

fn enclosing_scope(frame: &Frame<'_>, depth: u32) -> Option<Arc<StaticScope>> {
    StaticScope::enclosing(frame.static_scope, depth)
}

/// The static scope `depth` levels out from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurrentScope {
    depth: u32,
}

impl CurrentScope {
    pub fn new(depth: u32) -> Self {
        CurrentScope { depth }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Nil when `depth` walks past the outermost scope.
    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        enclosing_scope(frame, self.depth)
            .map(Value::Scope)
            .unwrap_or(Value::Nil)
    }
}

impl DepthCloneable for CurrentScope {
    fn clone_for_depth(&self, depth: u32) -> Self {
        CurrentScope { depth }
    }
}

/// Lexical module of the scope `depth` levels out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeModule {
    depth: u32,
}

impl ScopeModule {
    pub fn new(depth: u32) -> Self {
        ScopeModule { depth }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        let module = enclosing_scope(frame, self.depth)
            .and_then(|scope| scope.lexical_module())
            .unwrap_or_else(|| frame.runtime().object_class());
        Value::Module(module)
    }
}

impl DepthCloneable for ScopeModule {
    fn clone_for_depth(&self, depth: u32) -> Self {
        ScopeModule { depth }
    }
}

// =============================================================================
// Match references
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backref {
    /// `$&`
    Match,
    /// `` $` ``
    PreMatch,
    /// `$'`
    PostMatch,
    /// `$+`
    LastGroup,
}

impl Backref {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '&' => Some(Backref::Match),
            '`' => Some(Backref::PreMatch),
            '\'' => Some(Backref::PostMatch),
            '+' => Some(Backref::LastGroup),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Backref::Match => '&',
            Backref::PreMatch => '`',
            Backref::PostMatch => '\'',
            Backref::LastGroup => '+',
        }
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        let Some(data) = frame.context.backref() else {
            return Value::Nil;
        };
        let bytes = match self {
            Backref::Match => data.group(0),
            Backref::PreMatch => data.pre_match(),
            Backref::PostMatch => data.post_match(),
            Backref::LastGroup => data.last_group(),
        };
        match_string(bytes)
    }
}

/// `$1`, `$2`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NthRef {
    n: u32,
}

impl NthRef {
    pub fn new(n: u32) -> Self {
        NthRef { n }
    }

    pub fn n(&self) -> u32 {
        self.n
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        match frame.context.backref() {
            Some(data) => match_string(data.group(self.n as usize)),
            None => Value::Nil,
        }
    }
}

fn match_string(bytes: Option<&[u8]>) -> Value {
    match bytes {
        Some(bytes) => Value::string(RString::new(bytes.to_vec(), Encoding::Utf8)),
        None => Value::Nil,
    }
}

// =============================================================================
// Names
// =============================================================================

/// A method name used as an address, e.g. the target of `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethAddr {
    name: Arc<str>,
}

impl MethAddr {
    pub fn new(name: &str) -> Self {
        MethAddr {
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        Value::Symbol(frame.runtime().intern(&self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalVariable {
    name: Arc<str>,
}

impl GlobalVariable {
    /// `name` includes the leading `$`.
    pub fn new(name: &str) -> Self {
        GlobalVariable {
            name: Arc::from(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retrieve(&self, frame: &Frame<'_>) -> Value {
        frame.runtime().global(&self.name)
    }
}

pub fn retrieve_builtin(class: BuiltinClass, frame: &Frame<'_>) -> Value {
    Value::Module(frame.runtime().builtin(class))
}

/// `__FILE__`: the current scope's file as a shared frozen string.
pub fn retrieve_filename(frame: &Frame<'_>) -> Value {
    let bytes = frame.static_scope.file().as_bytes();
    let code_range = CodeRange::scan(bytes, Encoding::Utf8);
    Value::String(
        frame
            .runtime()
            .freeze_and_dedup(bytes, Encoding::Utf8, code_range),
    )
}

// =============================================================================
// Labels
// =============================================================================

/// Jump target. Never evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    prefix: Arc<str>,
    id: u32,
}

impl Label {
    pub fn new(prefix: &str, id: u32) -> Self {
        Label {
            prefix: Arc::from(prefix),
            id,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn id(&self) -> u32 {
        self.id
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.prefix, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::test_support::Harness;
    use crate::lang::object::{MatchData, RModule};
    use crate::runtime::scope::ScopeKind;

    #[test]
    fn test_current_scope_walks_out() {
        let h = Harness::new();
        let Value::Scope(scope) = CurrentScope::new(0).retrieve(&h.frame()) else {
            panic!("expected scope");
        };
        assert!(Arc::ptr_eq(&scope, &h.static_scope));
        let Value::Scope(outer) = CurrentScope::new(1).retrieve(&h.frame()) else {
            panic!("expected scope");
        };
        assert_eq!(outer.kind(), ScopeKind::Script);
        assert_eq!(CurrentScope::new(9).retrieve(&h.frame()), Value::Nil);
    }

    #[test]
    fn test_scope_module_defaults_to_object() {
        let h = Harness::new();
        let Value::Module(module) = ScopeModule::new(0).retrieve(&h.frame()) else {
            panic!("expected module");
        };
        assert!(Arc::ptr_eq(&module, &h.runtime.object_class()));
    }

    #[test]
    fn test_scope_module_uses_lexical_module() {
        let module = Arc::new(RModule::new("Greeter"));
        let h = Harness::with_scope(
            StaticScope::new(ScopeKind::Class, "g.rb", None).with_module(module.clone()),
        );
        let Value::Module(found) = ScopeModule::new(0).retrieve(&h.frame()) else {
            panic!("expected module");
        };
        assert!(Arc::ptr_eq(&found, &module));
    }

    #[test]
    fn test_depth_clone() {
        assert_eq!(CurrentScope::new(2).clone_for_depth(0).depth(), 0);
        assert_eq!(ScopeModule::new(0).clone_for_depth(3).depth(), 3);
    }

    #[test]
    fn test_backrefs_without_match_are_nil() {
        let h = Harness::new();
        assert_eq!(Backref::Match.retrieve(&h.frame()), Value::Nil);
        assert_eq!(NthRef::new(1).retrieve(&h.frame()), Value::Nil);
    }

    #[test]
    fn test_backrefs_read_last_match() {
        let h = Harness::new();
        // "say hello world" =~ /(hel)(lo)( x)?/
        h.context.set_backref(Some(MatchData::new(
            b"say hello world".to_vec(),
            vec![Some((4, 9)), Some((4, 7)), Some((7, 9)), None],
        )));
        let text = |v: Value| v.to_string();
        assert_eq!(text(Backref::Match.retrieve(&h.frame())), "\"hello\"");
        assert_eq!(text(Backref::PreMatch.retrieve(&h.frame())), "\"say \"");
        assert_eq!(text(Backref::PostMatch.retrieve(&h.frame())), "\" world\"");
        assert_eq!(text(NthRef::new(2).retrieve(&h.frame())), "\"lo\"");
        assert_eq!(NthRef::new(3).retrieve(&h.frame()), Value::Nil);
        assert_eq!(NthRef::new(7).retrieve(&h.frame()), Value::Nil);
    }

    #[test]
    fn test_backref_chars() {
        for c in ['&', '`', '\'', '+'] {
            assert_eq!(Backref::from_char(c).unwrap().as_char(), c);
        }
        assert!(Backref::from_char('x').is_none());
    }

    #[test]
    fn test_global_and_meth_addr() {
        let h = Harness::new();
        let global = GlobalVariable::new("$stdout_sync");
        assert_eq!(global.retrieve(&h.frame()), Value::Nil);
        h.runtime.set_global("$stdout_sync", Value::Bool(true));
        assert_eq!(global.retrieve(&h.frame()), Value::Bool(true));
        let addr = MethAddr::new("each").retrieve(&h.frame());
        assert!(addr.same(&Value::Symbol(h.runtime.intern("each"))));
    }

    #[test]
    fn test_filename_is_frozen_and_shared() {
        let h = Harness::new();
        let a = retrieve_filename(&h.frame());
        let b = retrieve_filename(&h.frame());
        assert!(a.same(&b));
        let Value::String(s) = a else {
            panic!("expected string");
        };
        assert!(s.is_frozen());
        assert_eq!(s.to_string_lossy(), "test.rb");
    }

    #[test]
    fn test_builtin_class() {
        let h = Harness::new();
        assert_eq!(retrieve_builtin(BuiltinClass::Hash, &h.frame()).to_string(), "Hash");
    }
}
