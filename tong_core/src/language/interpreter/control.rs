use super::value::Value;

/// Outcome of executing a statement. Non-`Normal` variants unwind until a
/// loop or function boundary consumes them.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

impl ControlFlow {
    pub fn is_normal(&self) -> bool {
        matches!(self, ControlFlow::Normal(_))
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            ControlFlow::Normal(_) => "",
            ControlFlow::Return(_) => "return",
            ControlFlow::Break => "break",
            ControlFlow::Continue => "continue",
        }
    }
}
