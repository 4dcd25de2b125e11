//! Bottom-up AST walk producing SQL text.

use tracing::{debug, warn};

use super::confidence::Confidence;
use super::error::TranslateError;
use super::result::TranslationResult;
use super::translator::Translator;
use crate::dax::{
    BinaryOp, BinaryOperator, ColumnRef, Expr, FunctionCall, IfExpr, Literal, MeasureDef,
    TableRef, UnaryOp, UnaryOperator, Variable, Visitor,
};
use crate::patterns::template::placeholders;
use crate::patterns::{Bindings, Complexity, DaxPattern, PatternCategory};
use crate::schema::{FilterContext, SchemaContext};
use crate::sql::{Dialect, SqlDialect};

type WalkResult<T> = Result<T, TranslateError>;

/// Interval arguments of DATEADD/PARALLELPERIOD, emitted as bare SQL words.
const INTERVALS: &[&str] = &["DAY", "WEEK", "MONTH", "QUARTER", "YEAR"];
const SORT_ORDERS: &[&str] = &["ASC", "DESC"];
const ITERATORS: &[&str] = &["SUMX", "AVERAGEX", "COUNTX", "MINX", "MAXX"];
const SWITCH_USAGE: &str = "an expression and at least one value/result pair";

/// Lowercase, spaces to underscores: the name used when nothing resolves.
fn guess(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

fn precedence(op: BinaryOperator) -> u8 {
    use BinaryOperator::*;
    match op {
        Or => 1,
        And => 2,
        Equals | NotEquals => 3,
        LessThan | LessEqual | GreaterThan | GreaterEqual => 4,
        Add | Subtract | Concat => 5,
        Multiply | Divide => 6,
        Power => 7,
    }
}

fn sql_operator(op: BinaryOperator) -> &'static str {
    match op {
        BinaryOperator::And => "AND",
        BinaryOperator::Or => "OR",
        other => other.symbol(),
    }
}

/// First column reference in `expr`, depth first, left to right.
fn first_column(expr: &Expr) -> Option<&ColumnRef> {
    match expr {
        Expr::Column(col) => Some(col),
        Expr::Binary(b) => first_column(&b.left).or_else(|| first_column(&b.right)),
        Expr::Unary(u) => first_column(&u.operand),
        Expr::Function(f) => f.args.iter().find_map(first_column),
        Expr::If(i) => first_column(&i.condition),
        Expr::Variable(v) => v.value.as_deref().and_then(first_column),
        Expr::Measure(m) => first_column(&m.expression),
        Expr::Literal(_) | Expr::Table(_) => None,
    }
}

/// A column reference after name resolution.
struct ResolvedColumn {
    /// `table.column`, or a bare column when no table is known.
    sql: String,
    table: Option<String>,
    column: String,
}

/// State for one translation call.
pub(super) struct Walk<'t> {
    translator: &'t Translator,
    filters: FilterContext,
    /// Tables iterated by enclosing X functions / FILTER, innermost last.
    row_tables: Vec<String>,
    /// Tables touched by each enclosing CALCULATE expression, innermost last.
    scopes: Vec<Vec<String>>,
    confidence: Confidence,
    patterns_applied: Vec<String>,
    tables_used: Vec<String>,
    warnings: Vec<String>,
}

impl<'t> Walk<'t> {
    pub(super) fn new(translator: &'t Translator) -> Self {
        Self {
            translator,
            filters: FilterContext::new(),
            row_tables: Vec::new(),
            scopes: Vec::new(),
            confidence: Confidence::High,
            patterns_applied: Vec::new(),
            tables_used: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub(super) fn finish(self, dax: &str, sql: String) -> TranslationResult {
        TranslationResult {
            dax: dax.to_string(),
            sql,
            success: true,
            confidence: self.confidence,
            patterns_applied: self.patterns_applied,
            tables_used: self.tables_used,
            warnings: self.warnings,
            errors: Vec::new(),
            enhanced_by: None,
        }
    }

    // ========================================================================
    // Bookkeeping
    // ========================================================================

    /// Schema context, if one with any tables was supplied.
    fn ctx(&self) -> Option<&'t SchemaContext> {
        let translator: &'t Translator = self.translator;
        translator.context.as_ref().filter(|c| !c.is_empty())
    }

    fn pattern(&self, name: &str) -> Option<&'t DaxPattern> {
        let translator: &'t Translator = self.translator;
        translator.patterns.get(name)
    }

    fn dialect(&self) -> Dialect {
        self.translator.dialect
    }

    fn note(&mut self, level: Confidence, warning: impl Into<String>) {
        self.confidence.demote(level);
        let warning = warning.into();
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    fn no_context(&mut self) {
        self.note(
            Confidence::Medium,
            "No schema context supplied; table and column names were guessed",
        );
    }

    fn use_table(&mut self, table: &str) {
        if !self.tables_used.iter().any(|t| t == table) {
            self.tables_used.push(table.to_string());
        }
        if let Some(scope) = self.scopes.last_mut() {
            if !scope.iter().any(|t| t == table) {
                scope.push(table.to_string());
            }
        }
    }

    fn use_pattern(&mut self, pattern: &DaxPattern) {
        if !self.patterns_applied.contains(&pattern.name) {
            self.patterns_applied.push(pattern.name.clone());
        }

        if pattern.needs_context && self.ctx().is_none() {
            self.note(
                Confidence::Medium,
                format!("{} needs schema context for an exact translation", pattern.name),
            );
        }
        if pattern.complexity == Complexity::Complex
            || pattern.category == PatternCategory::TimeIntelligence
        {
            self.confidence.demote(Confidence::Medium);
        }
        if pattern.dialect_specific && !self.dialect().runs_snowflake_templates() {
            self.note(
                Confidence::Medium,
                format!(
                    "{} uses Snowflake-specific SQL; review it for {}",
                    pattern.name,
                    self.dialect()
                ),
            );
        }
    }

    fn use_pattern_named(&mut self, name: &str) {
        if let Some(pattern) = self.pattern(name) {
            self.use_pattern(pattern);
        }
    }

    fn render(&mut self, expr: &Expr) -> WalkResult<String> {
        expr.accept(self)
    }

    // ========================================================================
    // Name resolution
    // ========================================================================

    /// SQL name of a table, recording its use.
    fn resolve_table(&mut self, name: &str) -> String {
        let resolved = match self.ctx() {
            Some(ctx) => match ctx.table(name) {
                Some(table) => table.name.clone(),
                None => {
                    let guessed = guess(name);
                    debug!(table = name, guessed = %guessed, "unknown table");
                    self.note(
                        Confidence::Low,
                        format!("Unknown table '{}'; guessed {}", name, guessed),
                    );
                    guessed
                }
            },
            None => {
                self.no_context();
                guess(name)
            }
        };
        self.use_table(&resolved);
        resolved
    }

    /// Schema-qualified name for a FROM/JOIN position.
    fn from_name(&self, table: &str) -> String {
        self.ctx()
            .and_then(|ctx| ctx.table(table))
            .map(|t| t.full_name())
            .unwrap_or_else(|| table.to_string())
    }

    fn resolve_column(&mut self, col: &ColumnRef) -> ResolvedColumn {
        match (self.ctx(), &col.table) {
            (Some(ctx), Some(table)) => {
                let table_sql = self.resolve_table(table);
                let column = match ctx.column(table, &col.column) {
                    Some(c) => c.name.clone(),
                    None => {
                        let guessed = guess(&col.column);
                        debug!(column = %col.qualified_name(), "unknown column");
                        self.note(
                            Confidence::Low,
                            format!("Unknown column {}; guessed {}", col.qualified_name(), guessed),
                        );
                        guessed
                    }
                };
                ResolvedColumn {
                    sql: format!("{}.{}", table_sql, column),
                    table: Some(table_sql),
                    column,
                }
            }
            (Some(ctx), None) => {
                let found = {
                    let preferred: Vec<&str> = self.row_tables.iter().map(String::as_str).collect();
                    ctx.find_column(&col.column, &preferred)
                };
                match found {
                    Some((table, column)) => {
                        let table = table.name.clone();
                        self.use_table(&table);
                        ResolvedColumn {
                            sql: format!("{}.{}", table, column.name),
                            table: Some(table),
                            column: column.name.clone(),
                        }
                    }
                    None => {
                        let guessed = guess(&col.column);
                        debug!(column = %col.column, "unresolved bracket reference");
                        self.note(
                            Confidence::Low,
                            format!(
                                "Unresolved reference [{}] (measure or unknown column); guessed {}",
                                col.column, guessed
                            ),
                        );
                        ResolvedColumn {
                            sql: guessed.clone(),
                            table: None,
                            column: guessed,
                        }
                    }
                }
            }
            (None, Some(table)) => {
                let table = self.resolve_table(table);
                let column = guess(&col.column);
                ResolvedColumn {
                    sql: format!("{}.{}", table, column),
                    table: Some(table),
                    column,
                }
            }
            (None, None) => {
                self.no_context();
                let column = guess(&col.column);
                match self.row_tables.last().cloned() {
                    Some(table) => ResolvedColumn {
                        sql: format!("{}.{}", table, column),
                        table: Some(table),
                        column,
                    },
                    None => ResolvedColumn {
                        sql: column.clone(),
                        table: None,
                        column,
                    },
                }
            }
        }
    }

    /// A table argument: its FROM text and, for plain tables, its SQL name.
    fn table_argument(&mut self, expr: &Expr) -> WalkResult<(String, Option<String>)> {
        match expr {
            Expr::Table(table) => {
                let name = self.resolve_table(&table.name);
                Ok((self.from_name(&name), Some(name)))
            }
            other => Ok((self.render(other)?, None)),
        }
    }

    fn operand(&mut self, child: &Expr, parent: u8, right_side: bool) -> WalkResult<String> {
        let sql = self.render(child)?;
        let wrap = match child {
            Expr::Binary(b) => {
                let p = precedence(b.op);
                p < parent || (right_side && p == parent)
            }
            _ => false,
        };
        Ok(if wrap { format!("({})", sql) } else { sql })
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn call_unknown(&mut self, node: &FunctionCall) -> WalkResult<String> {
        warn!(function = %node.name, "no pattern for DAX function, emitting plain call");
        self.note(
            Confidence::Low,
            format!(
                "Unknown function {}: emitted as a plain SQL call",
                node.upper_name()
            ),
        );
        self.plain_call(node)
    }

    /// A call whose arguments do not fit its pattern.
    fn call_malformed(&mut self, node: &FunctionCall, usage: &str) -> WalkResult<String> {
        debug!(function = %node.name, args = node.args.len(), "malformed call");
        self.note(
            Confidence::Low,
            format!(
                "{} expects {}; emitted as a plain SQL call",
                node.upper_name(),
                usage
            ),
        );
        self.plain_call(node)
    }

    fn plain_call(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let args = node
            .args
            .iter()
            .map(|arg| self.render(arg))
            .collect::<WalkResult<Vec<_>>>()?;
        let name = self
            .dialect()
            .remap_function(&node.name)
            .map(str::to_string)
            .unwrap_or_else(|| node.upper_name());
        Ok(format!("{}({})", name, args.join(", ")))
    }

    /// Any function whose arguments map straight onto template parameters.
    fn call_generic(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let Some(pattern) = self.pattern(&node.name) else {
            return self.call_unknown(node);
        };

        let mut args = Vec::with_capacity(node.args.len());
        let mut first_table = None;
        for (i, arg) in node.args.iter().enumerate() {
            let wants_table = pattern.params.get(i).is_some_and(|p| p == "table");
            match arg {
                Expr::Column(col) => {
                    let resolved = self.resolve_column(col);
                    if first_table.is_none() {
                        first_table = resolved.table.clone();
                    }
                    match (&resolved.table, wants_table) {
                        (Some(table), true) => args.push(self.from_name(table)),
                        _ => args.push(resolved.sql),
                    }
                }
                other => args.push(self.render(other)?),
            }
        }

        self.apply_pattern(pattern, args, first_table, Bindings::new())
    }

    /// Bind positional `args`, add `extra` bindings, score and render.
    fn apply_pattern(
        &mut self,
        pattern: &DaxPattern,
        args: Vec<String>,
        derived_table: Option<String>,
        extra: Bindings,
    ) -> WalkResult<String> {
        let bound = pattern.bind_args(args);
        let mut bindings = bound.bindings;
        bindings.extend(extra);

        for missing in &bound.missing {
            self.note(
                Confidence::Low,
                format!("{}: missing argument {}", pattern.name, missing),
            );
        }
        if bound.extra > 0 {
            self.note(
                Confidence::Medium,
                format!("{}: ignored {} extra argument(s)", pattern.name, bound.extra),
            );
        }
        if !bindings.contains_key("table") && placeholders(&pattern.template).contains(&"table") {
            let table = match derived_table {
                Some(table) => self.from_name(&table),
                None => {
                    self.note(
                        Confidence::Low,
                        format!("{}: could not determine the source table", pattern.name),
                    );
                    "NULL".to_string()
                }
            };
            bindings.insert("table".to_string(), table);
        }

        self.use_pattern(pattern);
        Ok(pattern.render(&bindings, &self.dialect())?)
    }

    /// `SUMX(table, expr)` and friends; `FILTER` as the table becomes a
    /// `CASE WHEN` guard inside the aggregate.
    fn iterate(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let Some(pattern) = self.pattern(&node.name) else {
            return self.call_unknown(node);
        };
        let [source, expression, rest @ ..] = node.args.as_slice() else {
            return self.call_malformed(node, "a table and an expression");
        };

        let (table_expr, condition) = match source {
            Expr::Function(f) if f.upper_name() == "FILTER" && f.args.len() == 2 => {
                self.use_pattern_named("FILTER");
                (&f.args[0], Some(&f.args[1]))
            }
            other => (other, None),
        };

        let (table_sql, row_table) = self.table_argument(table_expr)?;
        if let Some(table) = &row_table {
            self.row_tables.push(table.clone());
        }
        let value = self.render(expression);
        let guard = condition.map(|c| self.render(c)).transpose();
        if row_table.is_some() {
            self.row_tables.pop();
        }
        let (value, guard) = (value?, guard?);

        let value = match guard {
            Some(guard) => format!("CASE WHEN {} THEN {} END", guard, value),
            None => value,
        };

        let mut args = vec![table_sql, value];
        for arg in rest {
            args.push(self.render(arg)?);
        }
        self.apply_pattern(pattern, args, row_table, Bindings::new())
    }

    fn switch(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let [subject, branches @ ..] = node.args.as_slice() else {
            return self.call_malformed(node, SWITCH_USAGE);
        };
        if branches.len() < 2 {
            return self.call_malformed(node, SWITCH_USAGE);
        }

        let mut cases = Vec::new();
        for pair in branches.chunks(2) {
            match pair {
                [when, then] => {
                    let when = self.render(when)?;
                    let then = self.render(then)?;
                    cases.push(format!("WHEN {} THEN {}", when, then));
                }
                [default] => cases.push(format!("ELSE {}", self.render(default)?)),
                _ => {}
            }
        }
        let cases = cases.join(" ");

        // SWITCH(TRUE(), cond, result, ...) is a searched CASE.
        if matches!(subject, Expr::Literal(Literal::Boolean(true))) {
            self.use_pattern_named("SWITCH");
            return Ok(format!("CASE {} END", cases));
        }

        let subject = self.render(subject)?;
        match self.pattern("SWITCH") {
            Some(pattern) => {
                let mut bindings = Bindings::new();
                bindings.insert("expression".to_string(), subject);
                bindings.insert("cases".to_string(), cases);
                self.use_pattern(pattern);
                Ok(pattern.render(&bindings, &self.dialect())?)
            }
            None => Ok(format!("CASE {} {} END", subject, cases)),
        }
    }

    /// SUMMARIZE / ADDCOLUMNS / SELECTCOLUMNS: a table followed by group
    /// columns and `"name", expression` pairs.
    fn project(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let Some(pattern) = self.pattern(&node.name) else {
            return self.call_unknown(node);
        };
        let Some((table_arg, rest)) = node.args.split_first() else {
            return self.call_malformed(node, "a table argument");
        };

        let (table_sql, row_table) = self.table_argument(table_arg)?;
        if let Some(table) = &row_table {
            self.row_tables.push(table.clone());
        }

        let mut plain = Vec::new();
        let mut named = Vec::new();
        let mut i = 0;
        while i < rest.len() {
            match (&rest[i], rest.get(i + 1)) {
                (Expr::Literal(Literal::String(label)), Some(value)) => {
                    let value = self.render(value)?;
                    named.push(format!(
                        "{} AS {}",
                        value,
                        self.dialect().quote_identifier(label)
                    ));
                    i += 2;
                }
                (other, _) => {
                    plain.push(self.render(other)?);
                    i += 1;
                }
            }
        }

        if row_table.is_some() {
            self.row_tables.pop();
        }
        self.use_pattern(pattern);

        let sql = match pattern.name.as_str() {
            "SUMMARIZE" if named.is_empty() && plain.is_empty() => {
                format!("(SELECT DISTINCT * FROM {})", table_sql)
            }
            "SUMMARIZE" if named.is_empty() => {
                format!("(SELECT DISTINCT {} FROM {})", plain.join(", "), table_sql)
            }
            "SUMMARIZE" if plain.is_empty() => {
                format!("(SELECT {} FROM {})", named.join(", "), table_sql)
            }
            "SUMMARIZE" => {
                let mut bindings = Bindings::new();
                bindings.insert("table".to_string(), table_sql);
                bindings.insert("group_by".to_string(), plain.join(", "));
                bindings.insert("aggregations".to_string(), named.join(", "));
                pattern.render(&bindings, &self.dialect())?
            }
            _ => {
                plain.extend(named);
                if plain.is_empty() {
                    format!("(SELECT * FROM {})", table_sql)
                } else {
                    let mut bindings = Bindings::new();
                    bindings.insert("table".to_string(), table_sql);
                    bindings.insert("columns".to_string(), plain.join(", "));
                    pattern.render(&bindings, &self.dialect())?
                }
            }
        };
        Ok(sql)
    }

    fn total_to_date(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let name = node.upper_name();
        let period = match name.as_str() {
            "TOTALYTD" => "DATESYTD",
            "TOTALQTD" => "DATESQTD",
            _ => "DATESMTD",
        };
        let [expression, dates, rest @ ..] = node.args.as_slice() else {
            return self.call_malformed(node, "an expression and a dates column");
        };

        let mut filters = vec![Expr::call(period, vec![dates.clone()])];
        filters.extend(rest.iter().cloned());
        self.calculate(&name, expression, &filters)
    }

    // ========================================================================
    // CALCULATE and filter context
    // ========================================================================

    /// Render `expression` as a subquery over the tables it touches, filtered
    /// by the effective filter context after applying `filters`.
    ///
    /// Filters are applied before the expression is rendered so nested calls
    /// inherit them. The outer filter context is restored afterwards and
    /// siblings never see each other's filters.
    fn calculate(&mut self, name: &str, expression: &Expr, filters: &[Expr]) -> WalkResult<String> {
        let outer = self.filters.clone();

        self.scopes.push(Vec::new());
        let applied = filters.iter().try_for_each(|f| self.apply_filter(f));
        self.scopes.pop();
        if let Err(err) = applied {
            self.filters = outer;
            return Err(err);
        }

        self.scopes.push(Vec::new());
        let rendered = self.render(expression);
        let expr_tables = self.scopes.pop().unwrap_or_default();
        let expression_sql = match rendered {
            Ok(sql) => sql,
            Err(err) => {
                self.filters = outer;
                return Err(err);
            }
        };
        // The enclosing subquery reads from whatever this one aggregates.
        for table in &expr_tables {
            self.use_table(table);
        }

        let mut tables = expr_tables;
        for table in self.filter_tables() {
            if !tables.contains(&table) {
                tables.push(table);
            }
        }

        let conditions = self.filters.to_where_clause();
        self.filters = outer;

        if tables.is_empty() {
            if !conditions.is_empty() {
                self.note(
                    Confidence::Low,
                    format!("{}: filters dropped, no table to apply them to", name),
                );
            }
            self.use_pattern_named(name);
            return Ok(expression_sql);
        }

        let from = self.from_clause(&tables);
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions)
        };

        match self.pattern(name) {
            Some(pattern) => {
                let mut bindings = Bindings::new();
                bindings.insert("expression".to_string(), expression_sql);
                bindings.insert("from".to_string(), from);
                bindings.insert("where".to_string(), where_clause);
                self.use_pattern(pattern);
                Ok(pattern.render(&bindings, &self.dialect())?)
            }
            None => Ok(format!("(SELECT {} FROM {}{})", expression_sql, from, where_clause)),
        }
    }

    /// SQL names of tables with effective filters.
    fn filter_tables(&self) -> Vec<String> {
        let mut tables: Vec<String> = Vec::new();
        for (key, _) in self.filters.effective_filters() {
            let Some((table, _)) = key.split_once('.') else {
                continue;
            };
            if table.is_empty() {
                continue;
            }
            let name = self
                .ctx()
                .and_then(|ctx| ctx.table(table))
                .map(|t| t.name.clone())
                .unwrap_or_else(|| table.to_lowercase());
            if !tables.contains(&name) {
                tables.push(name);
            }
        }
        tables
    }

    /// `base JOIN ... ON ...` over every reachable table in `tables`.
    fn from_clause(&mut self, tables: &[String]) -> String {
        let Some((base, rest)) = tables.split_first() else {
            return String::new();
        };
        let mut from = self.from_name(base);
        if rest.is_empty() {
            return from;
        }

        let Some(ctx) = self.ctx() else {
            for table in rest {
                self.note(
                    Confidence::Low,
                    format!("Cannot join {} to {} without schema context", table, base),
                );
            }
            return from;
        };

        let mut reachable: Vec<&str> = vec![base.as_str()];
        for table in rest {
            if ctx.has_path(base, table) {
                reachable.push(table);
            } else {
                debug!(base = %base, table = %table, "no join path");
                self.note(
                    Confidence::Low,
                    format!("No relationship path from {} to {}; table left out of the join", base, table),
                );
            }
        }

        match ctx.join_clauses(&reachable) {
            Ok(clauses) => {
                for clause in clauses {
                    from.push(' ');
                    from.push_str(&clause);
                }
            }
            Err(err) => self.note(Confidence::Low, err.to_string()),
        }
        from
    }

    fn apply_filter(&mut self, filter: &Expr) -> WalkResult<()> {
        let Expr::Function(call) = filter else {
            return self.add_condition(filter);
        };

        match call.upper_name().as_str() {
            "ALL" | "REMOVEFILTERS" => {
                self.use_pattern_named(&call.name);
                if call.args.is_empty() {
                    self.filters.reset();
                }
                for arg in &call.args {
                    self.remove_target(arg);
                }
                Ok(())
            }
            "ALLEXCEPT" => {
                self.use_pattern_named("ALLEXCEPT");
                let Some((first, keep)) = call.args.split_first() else {
                    return Ok(());
                };
                let Expr::Table(table) = first else {
                    self.remove_target(first);
                    return Ok(());
                };
                let table = self.resolve_table(&table.name);
                let keep: Vec<String> = keep
                    .iter()
                    .filter_map(|arg| match arg {
                        Expr::Column(col) => Some(self.resolve_column(col).column),
                        _ => None,
                    })
                    .collect();
                let keep: Vec<&str> = keep.iter().map(String::as_str).collect();
                self.filters.remove_all_except(&table, &keep);
                Ok(())
            }
            "KEEPFILTERS" => {
                self.use_pattern_named("KEEPFILTERS");
                call.args.iter().try_for_each(|arg| self.apply_filter(arg))
            }
            "FILTER" if call.args.len() == 2 => {
                self.use_pattern_named("FILTER");
                let (_, row_table) = self.table_argument(&call.args[0])?;
                if let Some(table) = &row_table {
                    self.row_tables.push(table.clone());
                }
                let added = self.add_condition(&call.args[1]);
                if row_table.is_some() {
                    self.row_tables.pop();
                }
                added
            }
            _ => self.add_condition(filter),
        }
    }

    /// Register `filter` as a WHERE predicate keyed by its first column.
    fn add_condition(&mut self, filter: &Expr) -> WalkResult<()> {
        let condition = self.render(filter)?;
        let (table, column) = match first_column(filter) {
            Some(col) => {
                let resolved = self.resolve_column(col);
                (resolved.table.unwrap_or_default(), resolved.column)
            }
            None => (String::new(), condition.clone()),
        };
        self.filters.add_filter(&table, &column, condition);
        Ok(())
    }

    /// `ALL(table)` / `ALL(table[column])` inside CALCULATE.
    fn remove_target(&mut self, arg: &Expr) {
        match arg {
            Expr::Table(table) => {
                let table = self.resolve_table(&table.name);
                self.filters.remove_filter(&table, None);
            }
            Expr::Column(col) => {
                let resolved = self.resolve_column(col);
                if let Some(table) = resolved.table {
                    self.filters.remove_filter(&table, Some(&resolved.column));
                }
            }
            _ => {}
        }
    }
}

impl Visitor for Walk<'_> {
    type Output = String;
    type Error = TranslateError;

    fn visit_literal(&mut self, node: &Literal) -> WalkResult<String> {
        let dialect = self.dialect();
        Ok(match node {
            Literal::Integer(i) => i.to_string(),
            Literal::Float(f) => ryu::Buffer::new().format(*f).to_string(),
            Literal::String(s) => dialect.quote_string(s),
            Literal::Boolean(b) => dialect.format_bool(*b).to_string(),
            Literal::Blank => dialect.format_null().to_string(),
        })
    }

    fn visit_column(&mut self, node: &ColumnRef) -> WalkResult<String> {
        Ok(self.resolve_column(node).sql)
    }

    fn visit_table(&mut self, node: &TableRef) -> WalkResult<String> {
        let upper = node.name.to_uppercase();
        let is_table = self.ctx().and_then(|ctx| ctx.table(&node.name)).is_some();
        if !is_table && INTERVALS.contains(&upper.as_str()) {
            return Ok(upper.to_lowercase());
        }
        if !is_table && SORT_ORDERS.contains(&upper.as_str()) {
            return Ok(upper);
        }
        let table = self.resolve_table(&node.name);
        Ok(self.from_name(&table))
    }

    fn visit_function(&mut self, node: &FunctionCall) -> WalkResult<String> {
        let name = node.upper_name();
        match name.as_str() {
            "CALCULATE" | "CALCULATETABLE" => match node.args.split_first() {
                Some((expression, filters)) => self.calculate(&name, expression, filters),
                None => self.call_malformed(node, "an expression"),
            },
            "TOTALYTD" | "TOTALQTD" | "TOTALMTD" => self.total_to_date(node),
            "SWITCH" => self.switch(node),
            "SUMMARIZE" | "ADDCOLUMNS" | "SELECTCOLUMNS" => self.project(node),
            n if ITERATORS.contains(&n) => self.iterate(node),
            _ => self.call_generic(node),
        }
    }

    fn visit_binary(&mut self, node: &BinaryOp) -> WalkResult<String> {
        use BinaryOperator::*;

        if matches!(node.op, Equals | NotEquals) && (node.left.is_blank() || node.right.is_blank()) {
            let other = if node.right.is_blank() { &node.left } else { &node.right };
            let sql = self.operand(other, precedence(LessThan), false)?;
            let not = if node.op == NotEquals { "NOT " } else { "" };
            return Ok(format!("{} IS {}NULL", sql, not));
        }

        if node.op == Power {
            let base = self.render(&node.left)?;
            let exponent = self.render(&node.right)?;
            return Ok(format!("POWER({}, {})", base, exponent));
        }

        let prec = precedence(node.op);
        let left = self.operand(&node.left, prec, false)?;
        let right = self.operand(&node.right, prec, true)?;

        let dialect = self.dialect();
        Ok(match node.op {
            Concat if !dialect.supports_concat_operator() => format!("CONCAT({}, {})", left, right),
            Concat => format!("{} {} {}", left, dialect.concat_operator(), right),
            op => format!("{} {} {}", left, sql_operator(op), right),
        })
    }

    fn visit_unary(&mut self, node: &UnaryOp) -> WalkResult<String> {
        let operand = self.render(&node.operand)?;
        // `--x` opens a SQL line comment.
        let wrap = matches!(*node.operand, Expr::Binary(_) | Expr::Unary(_))
            || operand.starts_with('-');
        let operand = if wrap { format!("({})", operand) } else { operand };
        Ok(match node.op {
            UnaryOperator::Negate => format!("-{}", operand),
            UnaryOperator::Not => format!("NOT {}", operand),
        })
    }

    fn visit_variable(&mut self, node: &Variable) -> WalkResult<String> {
        match node.value.as_deref() {
            Some(value) => {
                let sql = self.render(value)?;
                Ok(match value {
                    Expr::Binary(_) => format!("({})", sql),
                    _ => sql,
                })
            }
            None => {
                self.note(
                    Confidence::Low,
                    format!("Variable {} has no bound value", node.name),
                );
                Ok(guess(&node.name))
            }
        }
    }

    fn visit_if(&mut self, node: &IfExpr) -> WalkResult<String> {
        let mut args = vec![self.render(&node.condition)?, self.render(&node.then_branch)?];
        if let Some(else_branch) = &node.else_branch {
            args.push(self.render(else_branch)?);
        }
        match self.pattern("IF") {
            Some(pattern) => self.apply_pattern(pattern, args, None, Bindings::new()),
            None => Ok(format!(
                "CASE WHEN {} THEN {} ELSE {} END",
                args[0],
                args[1],
                args.get(2).map(String::as_str).unwrap_or("NULL")
            )),
        }
    }

    fn visit_measure(&mut self, node: &MeasureDef) -> WalkResult<String> {
        let sql = self.render(&node.expression)?;
        Ok(format!(
            "{} AS {}",
            sql,
            self.dialect().quote_identifier(&node.name)
        ))
    }
}
