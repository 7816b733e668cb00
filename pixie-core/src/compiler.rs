//! Emitter: walks a parsed program and writes target-language source.
//!
//! The compiler owns every piece of per-compilation state (output
//! buffer, scope depth, symbol table, object registry), so independent
//! compilations never share anything.

use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::ast::{Expr, Stmt, TablePair};
use crate::error::{CompileError, CoreError, ResultExt};
use crate::keywords;
use crate::parser::parse;
use crate::typecheck::{ObjectRegistry, check_expression};
use crate::types::{DataType, Field};

/// Depth of the root block's scope. Declarations at any other depth are
/// emitted with the `local` qualifier.
pub const GLOBAL_SCOPE: usize = 1;

/// Compile a parsed program into target-language source.
pub fn compile(root: &Stmt) -> Result<String, CompileError> {
    let mut compiler = Compiler::new();
    compiler.compile_stmt(root)?;
    Ok(compiler.finish())
}

/// Parse and compile in one step.
pub fn compile_source(source: &str) -> Result<String, CoreError> {
    let root = parse(source)?;
    debug!("ast: {root:#?}");
    Ok(compile(&root)?)
}

#[derive(Debug, Clone)]
struct Variable {
    scope: usize,
    data_type: DataType,
}

#[derive(Debug, Default)]
pub struct Compiler {
    out: String,
    scope: usize,
    variables: HashMap<String, Variable>,
    objects: ObjectRegistry,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The text emitted so far.
    pub fn finish(self) -> String {
        self.out
    }

    pub fn compile_stmt(&mut self, stmt: &Stmt) -> Result<(), CompileError> {
        match stmt {
            Stmt::Block(stmts) => self.compile_block(stmts),
            Stmt::CallFunction { name, args } => self
                .compile_call(name, args)
                .context_with(|| format!("call to {name:?}")),
            Stmt::VarDeclare {
                name,
                data_type,
                init,
            } => self
                .compile_declare(name, data_type, init.as_ref())
                .context_with(|| format!("declaration of {name:?}")),
            Stmt::VarAssign { name, expr } => self
                .compile_assign(name, expr)
                .context_with(|| format!("assignment to {name:?}")),
            Stmt::ObjDefine { name, fields } => self.define_object(name, fields),
        }
    }

    /// Variables declared directly in the block go out of scope when it
    /// ends.
    fn compile_block(&mut self, stmts: &[Stmt]) -> Result<(), CompileError> {
        self.scope += 1;
        for stmt in stmts {
            trace!("compiling at scope {}: {stmt:?}", self.scope);
            self.compile_stmt(stmt)?;
            self.out.push('\n');
        }

        let scope = self.scope;
        let before = self.variables.len();
        self.variables.retain(|_, variable| variable.scope != scope);
        debug!(
            "leaving scope {scope}, {} variables dropped",
            before - self.variables.len()
        );

        self.scope -= 1;
        Ok(())
    }

    fn compile_call(&mut self, name: &str, args: &[Expr]) -> Result<(), CompileError> {
        self.out.push_str(name);
        self.out.push('(');
        self.compile_comma_separated(args)?;
        self.out.push(')');
        Ok(())
    }

    fn compile_declare(
        &mut self,
        name: &str,
        data_type: &DataType,
        init: Option<&Expr>,
    ) -> Result<(), CompileError> {
        if self.variables.contains_key(name) {
            return Err(CompileError::Redeclaration {
                namespace: "variable",
                name: name.to_string(),
            });
        }

        // Registered before the initializer, which may refer to it.
        self.variables.insert(
            name.to_string(),
            Variable {
                scope: self.scope,
                data_type: data_type.clone(),
            },
        );

        if self.scope != GLOBAL_SCOPE {
            self.out.push_str(keywords::LOCAL);
            self.out.push(' ');
        }
        self.out.push_str(name);
        self.out.push_str(" = ");

        match init {
            None => {
                let zero = self.zero_value(data_type)?;
                self.out.push_str(&zero);
            }
            Some(expr) => self.compile_value(data_type, expr)?,
        }
        Ok(())
    }

    fn compile_assign(&mut self, name: &str, expr: &Expr) -> Result<(), CompileError> {
        let target = self.lookup(name)?.data_type.clone();

        match expr {
            Expr::Variable(source) => {
                let found = self.lookup(source)?.data_type.to_string();
                let expected = target.to_string();
                if expected != found {
                    return Err(CompileError::TypeMismatch { expected, found });
                }
            }
            _ => check_expression(&target, expr, &self.objects)?,
        }

        self.out.push_str(name);
        self.out.push_str(" = ");
        self.compile_value(&target, expr)
    }

    fn define_object(&mut self, name: &str, fields: &[Field]) -> Result<(), CompileError> {
        if self.objects.contains_key(name) {
            return Err(CompileError::Redeclaration {
                namespace: "object",
                name: name.to_string(),
            });
        }
        debug!("registering object {name} with {} fields", fields.len());
        self.objects.insert(name.to_string(), fields.to_vec());
        Ok(())
    }

    /// Emit `expr` as the value of a slot of type `data_type`. A table
    /// written into a registered object type gets its full field set.
    fn compile_value(&mut self, data_type: &DataType, expr: &Expr) -> Result<(), CompileError> {
        if let (Expr::Table(pairs), Some(object)) = (expr, data_type.custom_name()) {
            if self.objects.contains_key(object) {
                return self.compile_object_table(object, pairs);
            }
        }
        self.compile_expr(expr)
    }

    /// Emit an object literal with every declared field, in declaration
    /// order. Fields the literal leaves out get their zero value.
    fn compile_object_table(
        &mut self,
        object: &str,
        pairs: &[TablePair],
    ) -> Result<(), CompileError> {
        let fields = self.objects.get(object).cloned().ok_or_else(|| {
            CompileError::UnresolvedObjectReference {
                name: object.to_string(),
            }
        })?;

        for key in dropped_keys(&fields, pairs) {
            warn!("{object} literal: dropping {key}, which is not a field");
        }

        self.out.push('{');
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.out.push('"');
            self.out.push_str(&field.name);
            self.out.push_str("\":");

            // A repeated key keeps its last value.
            let provided = pairs
                .iter()
                .rev()
                .find(|pair| pair.key.is_variable(&field.name));
            match provided {
                Some(pair) => self
                    .compile_value(&field.data_type, &pair.value)
                    .context_with(|| format!("field {:?} of {object}", field.name))?,
                None => {
                    let zero = self.zero_value(&field.data_type)?;
                    self.out.push_str(&zero);
                }
            }
        }
        self.out.push('}');
        Ok(())
    }

    fn compile_expr(&mut self, expr: &Expr) -> Result<(), CompileError> {
        match expr {
            Expr::Block(inner) => {
                self.out.push('(');
                self.compile_expr(inner)?;
                self.out.push(')');
            }
            Expr::Number(text) | Expr::Boolean(text) => self.out.push_str(text),
            Expr::String(text) => {
                self.out.push('"');
                self.out.push_str(text);
                self.out.push('"');
            }
            Expr::List(elements) => {
                self.out.push('[');
                self.compile_comma_separated(elements)?;
                self.out.push(']');
            }
            Expr::Table(pairs) => self.compile_table(pairs)?,
            Expr::Variable(name) => {
                self.lookup(name)?;
                self.out.push_str(name);
            }
            Expr::Index { left, index } => self.compile_index(left, index)?,
            Expr::PropertyAccess { left, property } => {
                self.compile_expr(left)?;
                self.out.push('.');
                self.out.push_str(property);
            }
            Expr::Binary { left, op, right } => {
                self.compile_expr(left)?;
                self.out.push(' ');
                self.out.push_str(op.target_symbol());
                self.out.push(' ');
                self.compile_expr(right)?;
            }
        }
        Ok(())
    }

    fn compile_comma_separated(&mut self, exprs: &[Expr]) -> Result<(), CompileError> {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.compile_expr(expr).context_with(|| format!("element {i}"))?;
        }
        Ok(())
    }

    /// Label keys name fields or string map keys, so they are quoted
    /// rather than looked up.
    fn compile_table(&mut self, pairs: &[TablePair]) -> Result<(), CompileError> {
        self.out.push('{');
        for (i, pair) in pairs.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            match &pair.key {
                Expr::Variable(label) => {
                    self.out.push('"');
                    self.out.push_str(label);
                    self.out.push('"');
                }
                key => self.compile_expr(key)?,
            }
            self.out.push(':');
            self.compile_expr(&pair.value)
                .context_with(|| format!("table value {i}"))?;
        }
        self.out.push('}');
        Ok(())
    }

    /// Lists are indexed from 0 in pixie and from 1 in the target, so an
    /// index into a variable known to hold a list is shifted by one.
    /// Any other container is indexed as written.
    fn compile_index(&mut self, left: &Expr, index: &Expr) -> Result<(), CompileError> {
        self.compile_expr(left)?;

        let shift = match left {
            Expr::Variable(name) => self
                .variables
                .get(name)
                .is_some_and(|variable| variable.data_type.is_list()),
            _ => false,
        };

        self.out.push('[');
        if shift {
            self.out.push('(');
            self.compile_expr(index)?;
            self.out.push_str(" + 1)");
        } else {
            self.compile_expr(index)?;
        }
        self.out.push(']');
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<&Variable, CompileError> {
        self.variables
            .get(name)
            .ok_or_else(|| CompileError::UndeclaredVariable {
                name: name.to_string(),
            })
    }

    /// Target-language default value for `data_type`, with every custom
    /// type expanded into a table of its fields' zero values.
    pub fn zero_value(&self, data_type: &DataType) -> Result<String, CompileError> {
        let resolved = self.resolve_type(data_type)?;
        resolved
            .zero_value()
            .ok_or_else(|| match data_type.custom_name() {
                Some(name) => CompileError::UnresolvedObjectReference {
                    name: name.to_string(),
                },
                None => CompileError::UnknownType {
                    name: data_type.to_string(),
                },
            })
    }

    /// Fill in `resolved` for every custom type reachable through object
    /// fields. List and map element types are left alone, since their
    /// zero values are empty and never need the element's fields.
    pub fn resolve_type(&self, data_type: &DataType) -> Result<DataType, CompileError> {
        let mut visiting = Vec::new();
        self.resolve_type_inner(data_type, &mut visiting)
    }

    fn resolve_type_inner(
        &self,
        data_type: &DataType,
        visiting: &mut Vec<String>,
    ) -> Result<DataType, CompileError> {
        match data_type {
            DataType::Number
            | DataType::String
            | DataType::Boolean
            | DataType::List(_)
            | DataType::Map { .. } => Ok(data_type.clone()),
            DataType::Object(fields) => Ok(DataType::Object(self.resolve_fields(fields, visiting)?)),
            DataType::Custom { name, .. } => {
                if visiting.iter().any(|seen| seen == name) {
                    return Err(CompileError::RecursiveObject { name: name.clone() });
                }
                let fields = self.objects.get(name).ok_or_else(|| {
                    CompileError::UnresolvedObjectReference { name: name.clone() }
                })?;

                visiting.push(name.clone());
                let resolved = self.resolve_fields(fields, visiting);
                visiting.pop();

                Ok(DataType::Custom {
                    name: name.clone(),
                    resolved: Some(Box::new(DataType::Object(resolved?))),
                })
            }
        }
    }

    fn resolve_fields(
        &self,
        fields: &[Field],
        visiting: &mut Vec<String>,
    ) -> Result<Vec<Field>, CompileError> {
        fields
            .iter()
            .map(|field| {
                Ok(Field::new(
                    field.name.clone(),
                    self.resolve_type_inner(&field.data_type, visiting)?,
                ))
            })
            .collect()
    }
}

/// Keys of an object literal that name no field of the object. They are
/// left out of the emitted table.
fn dropped_keys(fields: &[Field], pairs: &[TablePair]) -> Vec<String> {
    pairs
        .iter()
        .filter(|pair| match &pair.key {
            Expr::Variable(key) => !fields.iter().any(|field| &field.name == key),
            _ => true,
        })
        .map(|pair| match &pair.key {
            Expr::Variable(key) => format!("field {key:?}"),
            other => format!("{} key", other.describe()),
        })
        .collect()
}
