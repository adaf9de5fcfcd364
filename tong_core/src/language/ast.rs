use std::fmt;
use std::sync::Arc;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOperator {
    Negate,
    Not,
    Reference,
    Dereference,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeAnnotation {
    Named {
        name: String,
        generics: Vec<TypeAnnotation>,
    },
    Array {
        element: Box<TypeAnnotation>,
        size: Option<Box<Expression>>,
    },
    Tuple(Vec<TypeAnnotation>),
    Function {
        params: Vec<TypeAnnotation>,
        return_type: Box<TypeAnnotation>,
    },
    Reference {
        inner: Box<TypeAnnotation>,
        mutable: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<TypeAnnotation>,
    pub default_value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Identifier(String),
    Literal(Expression),
    Tuple(Vec<Pattern>),
    Array(Vec<Pattern>),
    Wildcard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub guard: Option<Expression>,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub generics: Vec<String>,
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Vec<Statement>,
    pub is_async: bool,
    pub is_gpu_kernel: bool,
    pub is_distributed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lambda {
    pub params: Vec<Parameter>,
    pub return_type: Option<TypeAnnotation>,
    pub body: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expression {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    None,
    Array(Vec<Expression>),
    Identifier(String),
    FieldAccess {
        object: Box<Expression>,
        field: String,
    },
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },
    MethodCall {
        object: Box<Expression>,
        method: String,
        args: Vec<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    Lambda(Arc<Lambda>),
    If {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Option<Box<Expression>>,
    },
    Match {
        subject: Box<Expression>,
        arms: Vec<MatchArm>,
    },
    Await(Box<Expression>),
    Parallel(Arc<Vec<Statement>>),
    Distributed(Arc<Vec<Statement>>),
    GpuKernelCall {
        kernel: Box<Expression>,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Statement {
    Expression(Expression),
    VariableDeclaration {
        name: String,
        type_annotation: Option<TypeAnnotation>,
        initializer: Option<Expression>,
        mutable: bool,
    },
    Assignment {
        target: Expression,
        value: Expression,
    },
    FunctionDeclaration(Arc<FunctionDeclaration>),
    Return(Option<Expression>),
    Break,
    Continue,
    If {
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
    While {
        condition: Expression,
        body: Vec<Statement>,
    },
    For {
        variable: String,
        iterable: Expression,
        body: Vec<Statement>,
    },
    Match {
        subject: Expression,
        arms: Vec<MatchArm>,
    },
    Import {
        path: Vec<String>,
        items: Vec<String>,
        alias: Option<String>,
    },
    Module {
        name: String,
        body: Vec<Statement>,
    },
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::Greater => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        };
        write!(f, "{}", symbol)
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "!",
            UnaryOperator::Reference => "&",
            UnaryOperator::Dereference => "*",
        };
        write!(f, "{}", symbol)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Compact, fully parenthesized rendering. Used by parser tests and the REPL.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Integer(n) => write!(f, "{}", n),
            Expression::Float(n) => write!(f, "{:?}", n),
            Expression::String(s) => write!(f, "{:?}", s),
            Expression::Boolean(b) => write!(f, "{}", b),
            Expression::None => write!(f, "None"),
            Expression::Array(elements) => {
                write!(f, "[")?;
                write_list(f, elements)?;
                write!(f, "]")
            }
            Expression::Identifier(name) => write!(f, "{}", name),
            Expression::FieldAccess { object, field } => write!(f, "{}.{}", object, field),
            Expression::Index { object, index } => write!(f, "{}[{}]", object, index),
            Expression::MethodCall { object, method, args } => {
                write!(f, "{}.{}(", object, method)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expression::Binary { left, operator, right } => write!(f, "({} {} {})", left, operator, right),
            Expression::Unary { operator, operand } => write!(f, "({}{})", operator, operand),
            Expression::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                write_list(f, args)?;
                write!(f, ")")
            }
            Expression::Lambda(lambda) => {
                write!(f, "|")?;
                let names: Vec<&str> = lambda.params.iter().map(|p| p.name.as_str()).collect();
                write_list(f, &names)?;
                write!(f, "| {}", lambda.body)
            }
            Expression::If { condition, then_branch, else_branch } => {
                write!(f, "if {} {{ {} }}", condition, then_branch)?;
                if let Some(else_branch) = else_branch {
                    write!(f, " else {{ {} }}", else_branch)?;
                }
                Ok(())
            }
            Expression::Match { subject, arms } => write!(f, "match {} {{ {} arms }}", subject, arms.len()),
            Expression::Await(inner) => write!(f, "await {}", inner),
            Expression::Parallel(statements) => write!(f, "parallel {{ {} statements }}", statements.len()),
            Expression::Distributed(statements) => write!(f, "distributed {{ {} statements }}", statements.len()),
            Expression::GpuKernelCall { kernel, args } => {
                write!(f, "gpu_kernel {}(", kernel)?;
                write_list(f, args)?;
                write!(f, ")")
            }
        }
    }
}
