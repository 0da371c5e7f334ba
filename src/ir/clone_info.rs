//! Rename contexts consulted by `Operand::clone_for_inlining`.

use rustc_hash::FxHashMap;

use super::operand::Operand;
use super::reference::Label;
use super::variable::{TempKind, TemporaryVariable, Variable};

/// Supplies the replacement for every renameable operand met while copying
/// an operand tree into another scope.
pub trait CloneInfo {
    fn renamed_variable(&mut self, variable: &Variable) -> Variable;

    fn renamed_label(&mut self, label: &Label) -> Label;

    fn renamed_self(&mut self) -> Operand {
        Operand::self_value()
    }
}

/// Explicit rename tables; anything not listed maps to itself.
///
/// With fresh labels enabled every label met gets a new id, which is what
/// duplicating a scope body in place needs.
#[derive(Debug, Default)]
pub struct SimpleCloneInfo {
    variables: FxHashMap<Variable, Variable>,
    labels: FxHashMap<Label, Label>,
    next_label_id: Option<u32>,
}

impl SimpleCloneInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fresh_labels(first_id: u32) -> Self {
        SimpleCloneInfo {
            next_label_id: Some(first_id),
            ..Self::default()
        }
    }

    pub fn rename_variable(&mut self, from: Variable, to: Variable) {
        self.variables.insert(from, to);
    }

    pub fn rename_label(&mut self, from: Label, to: Label) {
        self.labels.insert(from, to);
    }
}

impl CloneInfo for SimpleCloneInfo {
    fn renamed_variable(&mut self, variable: &Variable) -> Variable {
        self.variables
            .get(variable)
            .cloned()
            .unwrap_or_else(|| variable.clone())
    }

    fn renamed_label(&mut self, label: &Label) -> Label {
        if let Some(renamed) = self.labels.get(label) {
            return renamed.clone();
        }
        let Some(id) = self.next_label_id.as_mut() else {
            return label.clone();
        };
        let fresh = Label::new(label.prefix(), *id);
        *id += 1;
        self.labels.insert(label.clone(), fresh.clone());
        fresh
    }
}

#[derive(Debug, Clone)]
enum InlineMode {
    /// A method body spliced into its caller; `self` becomes the receiver.
    Method { receiver: Operand },
    /// A block body spliced `levels_removed` lexical levels outward.
    Closure { levels_removed: u32 },
}

/// Renaming for method and closure inlining.
///
/// Slots of scopes that disappear become fresh host temporaries, allocated
/// from `first_free_temp` upward and memoized, so every use of one callee
/// variable lands in the same host slot.
#[derive(Debug)]
pub struct InlineCloneInfo {
    mode: InlineMode,
    inline_id: u32,
    next_temp: u32,
    // Keyed by depth too: two locals may share (name, offset) at different
    // depths and still be distinct slots.
    variables: FxHashMap<(Variable, Option<u32>), Variable>,
    labels: FxHashMap<Label, Label>,
}

impl InlineCloneInfo {
    pub fn for_method(receiver: Operand, first_free_temp: u32, inline_id: u32) -> Self {
        Self::new(InlineMode::Method { receiver }, first_free_temp, inline_id)
    }

    pub fn for_closure(levels_removed: u32, first_free_temp: u32, inline_id: u32) -> Self {
        Self::new(
            InlineMode::Closure { levels_removed },
            first_free_temp,
            inline_id,
        )
    }

    fn new(mode: InlineMode, first_free_temp: u32, inline_id: u32) -> Self {
        InlineCloneInfo {
            mode,
            inline_id,
            next_temp: first_free_temp,
            variables: FxHashMap::default(),
            labels: FxHashMap::default(),
        }
    }

    /// First host temporary not yet handed out.
    pub fn next_temp(&self) -> u32 {
        self.next_temp
    }

    fn fresh_temp(&mut self, like: &Variable) -> Variable {
        let offset = self.next_temp;
        self.next_temp += 1;
        let temp = match like {
            Variable::Temporary(t) => match t.kind() {
                TempKind::Fixnum | TempKind::Float | TempKind::Boolean => t.with_offset(offset),
                _ => TemporaryVariable::local(offset),
            },
            _ => TemporaryVariable::local(offset),
        };
        Variable::Temporary(temp)
    }

    fn rebound(&self, variable: &Variable) -> Option<Variable> {
        let InlineMode::Closure { levels_removed } = self.mode else {
            return None;
        };
        let depth = variable.scope_depth()?;
        if depth < levels_removed {
            return None;
        }
        variable.clone_for_depth(depth - levels_removed)
    }
}

impl CloneInfo for InlineCloneInfo {
    fn renamed_variable(&mut self, variable: &Variable) -> Variable {
        if variable.is_self() {
            return variable.clone();
        }
        if let Some(captured) = self.rebound(variable) {
            return captured;
        }
        let key = (variable.clone(), variable.scope_depth());
        if let Some(renamed) = self.variables.get(&key) {
            return renamed.clone();
        }
        let renamed = self.fresh_temp(variable);
        tracing::debug!(
            inline_id = self.inline_id,
            from = %variable,
            to = %renamed,
            "renamed for inlining"
        );
        self.variables.insert(key, renamed.clone());
        renamed
    }

    fn renamed_label(&mut self, label: &Label) -> Label {
        if let Some(renamed) = self.labels.get(label) {
            return renamed.clone();
        }
        let prefix = format!("{}_inl{}", label.prefix(), self.inline_id);
        let renamed = Label::new(&prefix, label.id());
        self.labels.insert(label.clone(), renamed.clone());
        renamed
    }

    fn renamed_self(&mut self) -> Operand {
        match &self.mode {
            InlineMode::Method { receiver } => receiver.clone(),
            InlineMode::Closure { .. } => Operand::self_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_clone_info_defaults_to_identity() {
        let mut info = SimpleCloneInfo::new();
        let x = Variable::local("x", 0, 1);
        assert_eq!(info.renamed_variable(&x), x);
        let l = Label::new("LBL", 3);
        assert_eq!(info.renamed_label(&l), l);
    }

    #[test]
    fn test_simple_clone_info_tables() {
        let mut info = SimpleCloneInfo::new();
        info.rename_variable(Variable::temp(0), Variable::temp(9));
        assert_eq!(info.renamed_variable(&Variable::temp(0)), Variable::temp(9));
        assert_eq!(info.renamed_variable(&Variable::temp(1)), Variable::temp(1));
    }

    #[test]
    fn test_fresh_labels_are_memoized() {
        let mut info = SimpleCloneInfo::with_fresh_labels(100);
        let a = Label::new("LBL", 1);
        let b = Label::new("LBL", 2);
        assert_eq!(info.renamed_label(&a), Label::new("LBL", 100));
        assert_eq!(info.renamed_label(&b), Label::new("LBL", 101));
        assert_eq!(info.renamed_label(&a), Label::new("LBL", 100));
    }

    #[test]
    fn test_method_inlining_renames_to_host_temps() {
        let receiver = Operand::temp(7);
        let mut info = InlineCloneInfo::for_method(receiver.clone(), 20, 1);
        let a = info.renamed_variable(&Variable::local("a", 0, 0));
        let t = info.renamed_variable(&Variable::temp(0));
        let i = info.renamed_variable(&Variable::Temporary(TemporaryVariable::fixnum(2)));
        assert_eq!(a, Variable::temp(20));
        assert_eq!(t, Variable::temp(21));
        assert_eq!(i, Variable::Temporary(TemporaryVariable::fixnum(22)));
        assert_eq!(info.renamed_variable(&Variable::local("a", 0, 0)), a);
        assert_eq!(info.next_temp(), 23);
        assert!(info.renamed_self().same(&receiver));
    }

    #[test]
    fn test_closure_inlining_rebinds_captured_locals() {
        let mut info = InlineCloneInfo::for_closure(1, 5, 2);
        let captured = info.renamed_variable(&Variable::local("outer", 2, 4));
        assert_eq!(captured.scope_depth(), Some(1));
        assert_eq!(captured, Variable::local("outer", 2, 4));

        let own = info.renamed_variable(&Variable::local("inner", 0, 0));
        assert_eq!(own, Variable::temp(5));
        assert_eq!(info.renamed_self(), Operand::self_value());
    }

    #[test]
    fn test_closure_inlining_keeps_same_slot_at_other_depth_distinct() {
        let mut info = InlineCloneInfo::for_closure(2, 0, 0);
        let shallow = info.renamed_variable(&Variable::local("x", 0, 1));
        let deeper = info.renamed_variable(&Variable::local("x", 1, 1));
        assert_ne!(shallow, deeper);
    }

    #[test]
    fn test_inline_labels_get_unique_prefix() {
        let mut info = InlineCloneInfo::for_method(Operand::self_value(), 0, 4);
        let renamed = info.renamed_label(&Label::new("LBL", 3));
        assert_eq!(renamed.to_string(), "LBL_inl4_3");
    }
}
