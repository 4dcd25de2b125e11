//! AST node types for DAX expressions.
//!
//! The tree is a closed sum type ([`Expr`]) with nine variants. Parents own
//! their children exclusively and nodes are never mutated after the parser
//! builds them. Traversal goes through the [`Visitor`] trait, which has one
//! handler per variant; a handler that is not overridden fails with
//! [`Unhandled`] instead of silently doing nothing.

use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

// ============================================================================
// Operators
// ============================================================================

/// Binary operators in DAX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equals,
    NotEquals,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    And,
    Or,
    /// `&` string concatenation.
    Concat,
}

impl BinaryOperator {
    /// The DAX spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Power => "^",
            BinaryOperator::Equals => "=",
            BinaryOperator::NotEquals => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Concat => "&",
        }
    }

    /// Does this operator produce a boolean?
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Equals
                | BinaryOperator::NotEquals
                | BinaryOperator::LessThan
                | BinaryOperator::LessEqual
                | BinaryOperator::GreaterThan
                | BinaryOperator::GreaterEqual
        )
    }
}

/// Unary operators in DAX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Negate,
    Not,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
            UnaryOperator::Not => "NOT",
        }
    }
}

// ============================================================================
// Function categories
// ============================================================================

/// Static category of a DAX function, derived from its name.
///
/// Informational only; the translator consults it when scoring confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Aggregation,
    Filter,
    TimeIntelligence,
    Logical,
    Text,
    Math,
    Table,
    Unknown,
}

impl FunctionCategory {
    /// Categorize a function name (any case).
    pub fn of(name: &str) -> Self {
        let upper = name.to_ascii_uppercase();
        let upper = upper.as_str();
        if AGGREGATIONS.contains(&upper) {
            FunctionCategory::Aggregation
        } else if FILTERS.contains(&upper) {
            FunctionCategory::Filter
        } else if TIME_INTELLIGENCE.contains(&upper) {
            FunctionCategory::TimeIntelligence
        } else if LOGICAL.contains(&upper) {
            FunctionCategory::Logical
        } else if TEXT.contains(&upper) {
            FunctionCategory::Text
        } else if MATH.contains(&upper) {
            FunctionCategory::Math
        } else if TABLE.contains(&upper) {
            FunctionCategory::Table
        } else {
            FunctionCategory::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Aggregation => "aggregation",
            FunctionCategory::Filter => "filter",
            FunctionCategory::TimeIntelligence => "time_intelligence",
            FunctionCategory::Logical => "logical",
            FunctionCategory::Text => "text",
            FunctionCategory::Math => "math",
            FunctionCategory::Table => "table",
            FunctionCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const AGGREGATIONS: &[&str] = &[
    "SUM", "AVERAGE", "COUNT", "COUNTROWS", "MIN", "MAX", "SUMX", "AVERAGEX", "COUNTX", "MINX",
    "MAXX", "DISTINCTCOUNT", "DISTINCTCOUNTNOBLANK",
];
const FILTERS: &[&str] = &[
    "FILTER", "ALL", "ALLEXCEPT", "ALLSELECTED", "VALUES", "CALCULATE", "CALCULATETABLE",
    "KEEPFILTERS", "REMOVEFILTERS",
];
const TIME_INTELLIGENCE: &[&str] = &[
    "DATEADD", "SAMEPERIODLASTYEAR", "PREVIOUSYEAR", "PREVIOUSMONTH", "DATESYTD", "DATESMTD",
    "DATESQTD", "TOTALYTD", "TOTALMTD", "PARALLELPERIOD", "DATESBETWEEN", "DATESINPERIOD",
];
const LOGICAL: &[&str] = &[
    "IF", "SWITCH", "AND", "OR", "NOT", "TRUE", "FALSE", "IFERROR", "ISBLANK", "ISERROR",
    "COALESCE",
];
const TEXT: &[&str] = &[
    "CONCATENATE", "FORMAT", "LEFT", "RIGHT", "MID", "LEN", "UPPER", "LOWER", "TRIM",
    "SUBSTITUTE", "SEARCH", "FIND",
];
const MATH: &[&str] = &[
    "DIVIDE", "ABS", "ROUND", "ROUNDUP", "ROUNDDOWN", "INT", "MOD", "POWER", "SQRT", "LOG",
    "EXP", "SIGN",
];
const TABLE: &[&str] = &[
    "SUMMARIZE", "ADDCOLUMNS", "SELECTCOLUMNS", "CROSSJOIN", "UNION", "INTERSECT", "EXCEPT",
    "NATURALINNERJOIN",
];

// ============================================================================
// Nodes
// ============================================================================

/// A literal value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    /// `BLANK()`, rendered as SQL NULL.
    Blank,
}

impl Literal {
    pub fn literal_type(&self) -> &'static str {
        match self {
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
            Literal::Boolean(_) => "boolean",
            Literal::Blank => "blank",
        }
    }

    fn value(&self) -> Value {
        match self {
            Literal::Integer(i) => json!(i),
            Literal::Float(f) => json!(f),
            Literal::String(s) => json!(s),
            Literal::Boolean(b) => json!(b),
            Literal::Blank => Value::Null,
        }
    }
}

/// `Table[Column]` or unqualified `[Column]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// `None` for `[Column]`.
    pub table: Option<String>,
    pub column: String,
}

impl ColumnRef {
    /// The reference in `Table[Column]` form.
    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}[{}]", quote_table(table), self.column),
            None => format!("[{}]", self.column),
        }
    }
}

/// A bare table reference (`Sales`, `'Dim Date'`).
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub name: String,
}

/// A function call.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    /// Function name as spelled in the source.
    pub name: String,
    pub args: Vec<Expr>,
}

impl FunctionCall {
    /// Uppercased function name, the key for pattern lookups.
    pub fn upper_name(&self) -> String {
        self.name.to_ascii_uppercase()
    }

    pub fn category(&self) -> FunctionCategory {
        FunctionCategory::of(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub left: Box<Expr>,
    pub op: BinaryOperator,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOperator,
    pub operand: Box<Expr>,
}

/// A reference to a `VAR` binding.
///
/// The parser resolves references against its scope and stores the bound
/// expression in `value`, so consumers can substitute without keeping their
/// own scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub value: Option<Box<Expr>>,
}

/// `IF(condition, then[, else])`.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpr {
    pub condition: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Option<Box<Expr>>,
}

/// `[Measure Name] = expression`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureDef {
    pub name: String,
    pub expression: Box<Expr>,
    pub format_string: Option<String>,
    pub description: Option<String>,
}

/// Any DAX expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Column(ColumnRef),
    Table(TableRef),
    Function(FunctionCall),
    Binary(BinaryOp),
    Unary(UnaryOp),
    Variable(Variable),
    If(IfExpr),
    Measure(MeasureDef),
}

/// Discriminant of an [`Expr`], used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Literal,
    Column,
    Table,
    Function,
    Binary,
    Unary,
    Variable,
    If,
    Measure,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Literal => "literal",
            NodeKind::Column => "column",
            NodeKind::Table => "table",
            NodeKind::Function => "function",
            NodeKind::Binary => "binary_op",
            NodeKind::Unary => "unary_op",
            NodeKind::Variable => "variable",
            NodeKind::If => "if_expression",
            NodeKind::Measure => "measure",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl Expr {
    pub fn integer(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn float(value: f64) -> Self {
        Expr::Literal(Literal::Float(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn blank() -> Self {
        Expr::Literal(Literal::Blank)
    }

    pub fn column(table: Option<&str>, column: impl Into<String>) -> Self {
        Expr::Column(ColumnRef {
            table: table.map(str::to_string),
            column: column.into(),
        })
    }

    pub fn table(name: impl Into<String>) -> Self {
        Expr::Table(TableRef { name: name.into() })
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function(FunctionCall {
            name: name.into(),
            args,
        })
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::Binary(BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    pub fn unary(op: UnaryOperator, operand: Expr) -> Self {
        Expr::Unary(UnaryOp {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn if_expr(condition: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Self {
        Expr::If(IfExpr {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        })
    }

    pub fn var_reference(name: impl Into<String>, bound: Option<Expr>) -> Self {
        Expr::Variable(Variable {
            name: name.into(),
            value: bound.map(Box::new),
        })
    }

    pub fn measure(name: impl Into<String>, expression: Expr) -> Self {
        Expr::Measure(MeasureDef {
            name: name.into(),
            expression: Box::new(expression),
            format_string: None,
            description: None,
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Literal(_) => NodeKind::Literal,
            Expr::Column(_) => NodeKind::Column,
            Expr::Table(_) => NodeKind::Table,
            Expr::Function(_) => NodeKind::Function,
            Expr::Binary(_) => NodeKind::Binary,
            Expr::Unary(_) => NodeKind::Unary,
            Expr::Variable(_) => NodeKind::Variable,
            Expr::If(_) => NodeKind::If,
            Expr::Measure(_) => NodeKind::Measure,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Expr::Literal(Literal::Blank))
    }

    /// Dispatch to the visitor handler for this variant.
    pub fn accept<V: Visitor>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        match self {
            Expr::Literal(node) => visitor.visit_literal(node),
            Expr::Column(node) => visitor.visit_column(node),
            Expr::Table(node) => visitor.visit_table(node),
            Expr::Function(node) => visitor.visit_function(node),
            Expr::Binary(node) => visitor.visit_binary(node),
            Expr::Unary(node) => visitor.visit_unary(node),
            Expr::Variable(node) => visitor.visit_variable(node),
            Expr::If(node) => visitor.visit_if(node),
            Expr::Measure(node) => visitor.visit_measure(node),
        }
    }

    /// Generic key/value form of the tree, for debugging and logging.
    pub fn to_value(&self) -> Value {
        match self {
            Expr::Literal(lit) => json!({
                "type": "literal",
                "value": lit.value(),
                "literal_type": lit.literal_type(),
            }),
            Expr::Column(col) => json!({
                "type": "column",
                "table": col.table,
                "column": col.column,
                "qualified_name": col.qualified_name(),
            }),
            Expr::Table(table) => json!({
                "type": "table",
                "name": table.name,
            }),
            Expr::Function(call) => json!({
                "type": "function",
                "name": call.name,
                "category": call.category().as_str(),
                "arguments": call.args.iter().map(Expr::to_value).collect::<Vec<_>>(),
                "argument_count": call.args.len(),
            }),
            Expr::Binary(bin) => json!({
                "type": "binary_op",
                "operator": bin.op.symbol(),
                "left": bin.left.to_value(),
                "right": bin.right.to_value(),
            }),
            Expr::Unary(un) => json!({
                "type": "unary_op",
                "operator": un.op.symbol(),
                "operand": un.operand.to_value(),
            }),
            Expr::Variable(var) => {
                let mut value = json!({
                    "type": "variable",
                    "name": var.name,
                });
                if let Some(expr) = &var.value {
                    value["expression"] = expr.to_value();
                }
                value
            }
            Expr::If(node) => {
                let mut value = json!({
                    "type": "if_expression",
                    "condition": node.condition.to_value(),
                    "true_result": node.then_branch.to_value(),
                });
                if let Some(else_branch) = &node.else_branch {
                    value["false_result"] = else_branch.to_value();
                }
                value
            }
            Expr::Measure(m) => json!({
                "type": "measure",
                "name": m.name,
                "expression": m.expression.to_value(),
                "format_string": m.format_string,
                "description": m.description,
            }),
        }
    }
}

fn quote_table(name: &str) -> String {
    if name.contains(' ') {
        format!("'{}'", name)
    } else {
        name.to_string()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::String(s)) => write!(f, "\"{}\"", s),
            Expr::Literal(Literal::Blank) => write!(f, "BLANK()"),
            Expr::Literal(Literal::Boolean(true)) => write!(f, "TRUE"),
            Expr::Literal(Literal::Boolean(false)) => write!(f, "FALSE"),
            Expr::Literal(Literal::Integer(i)) => write!(f, "{}", i),
            Expr::Literal(Literal::Float(x)) => write!(f, "{}", x),
            Expr::Column(col) => write!(f, "{}", col.qualified_name()),
            Expr::Table(table) => write!(f, "{}", quote_table(&table.name)),
            Expr::Function(call) => {
                write!(f, "{}(", call.name)?;
                for (i, arg) in call.args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Binary(bin) => write!(f, "({} {} {})", bin.left, bin.op.symbol(), bin.right),
            Expr::Unary(un) => match un.op {
                UnaryOperator::Not => write!(f, "NOT {}", un.operand),
                UnaryOperator::Negate => write!(f, "-{}", un.operand),
            },
            Expr::Variable(var) => write!(f, "{}", var.name),
            Expr::If(node) => match &node.else_branch {
                Some(else_branch) => write!(
                    f,
                    "IF({}, {}, {})",
                    node.condition, node.then_branch, else_branch
                ),
                None => write!(f, "IF({}, {})", node.condition, node.then_branch),
            },
            Expr::Measure(m) => write!(f, "[{}] = {}", m.name, m.expression),
        }
    }
}

// ============================================================================
// Visitor
// ============================================================================

/// A visitor handler was not implemented for a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no visitor handler implemented for {0} nodes")]
pub struct Unhandled(pub NodeKind);

/// Closed-dispatch visitor over [`Expr`].
///
/// Every handler defaults to failing with [`Unhandled`], so a visitor that
/// forgets a variant surfaces the gap at the first such node.
pub trait Visitor {
    type Output;
    type Error: From<Unhandled>;

    fn visit_literal(&mut self, _node: &Literal) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Literal).into())
    }

    fn visit_column(&mut self, _node: &ColumnRef) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Column).into())
    }

    fn visit_table(&mut self, _node: &TableRef) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Table).into())
    }

    fn visit_function(&mut self, _node: &FunctionCall) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Function).into())
    }

    fn visit_binary(&mut self, _node: &BinaryOp) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Binary).into())
    }

    fn visit_unary(&mut self, _node: &UnaryOp) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Unary).into())
    }

    fn visit_variable(&mut self, _node: &Variable) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Variable).into())
    }

    fn visit_if(&mut self, _node: &IfExpr) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::If).into())
    }

    fn visit_measure(&mut self, _node: &MeasureDef) -> Result<Self::Output, Self::Error> {
        Err(Unhandled(NodeKind::Measure).into())
    }
}
