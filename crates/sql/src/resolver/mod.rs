//! The resolution pipeline
//!
//! Walks an unresolved command and rewrites it in place: groups first, then
//! element references (fully qualified against the scope), then types
//! bottom-up. Consults the permanent catalog, falling through to the
//! temporary registry; names that bind nowhere are fatal. No partially
//! resolved tree escapes - on error the caller discards the command.

mod elements;
mod groups;
mod typing;

use crate::ast::{
    Command, Expression, GroupBinding, GroupSymbol, Insert, InsertSource, QueryCommand, Select,
    StoredProcedure,
};
use crate::context::CommandContext;
use crate::dialect::{Capability, Dialect};
use crate::error::{Error, Result};
use crate::functions::FunctionLibrary;
use crate::metadata::{MetadataStore, TempMetadataStore, TempMetadataType};
use crate::types::DataType;
use tracing::debug;

/// Lexical scopes during resolution: innermost last. Element lookups search
/// inward-out, so correlated subqueries see enclosing scopes while shadowing
/// them with their own groups.
pub(crate) struct ScopeStack {
    scopes: Vec<Vec<GroupSymbol>>,
}

impl ScopeStack {
    fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    fn push(&mut self, groups: Vec<GroupSymbol>) {
        self.scopes.push(groups);
    }

    fn pop(&mut self) {
        self.scopes.pop();
    }

    fn inner_out(&self) -> impl Iterator<Item = &[GroupSymbol]> {
        self.scopes.iter().rev().map(Vec::as_slice)
    }
}

/// Resolves commands against a metadata store and function library under one
/// dialect revision.
pub struct Resolver<'a> {
    metadata: &'a dyn MetadataStore,
    library: &'a FunctionLibrary,
    dialect: Dialect,
}

impl<'a> Resolver<'a> {
    pub fn new(
        metadata: &'a dyn MetadataStore,
        library: &'a FunctionLibrary,
        dialect: Dialect,
    ) -> Self {
        Self {
            metadata,
            library,
            dialect,
        }
    }

    /// Resolve `command` in place. Returns the registry of temporary
    /// identities created along the way; they live as long as the caller
    /// keeps the registry (or the identities) alive.
    pub fn resolve(
        &self,
        command: &mut Command,
        context: &mut CommandContext,
    ) -> Result<TempMetadataStore> {
        let mut temp = TempMetadataStore::new();
        let mut scopes = ScopeStack::new();
        self.resolve_command(command, &mut temp, &mut scopes, context)?;
        debug!(
            temp_groups = temp.len(),
            determinism = ?context.determinism_level(),
            "command resolved"
        );
        Ok(temp)
    }

    fn resolve_command(
        &self,
        command: &mut Command,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        match command {
            Command::Query(query) => self.resolve_query(query, temp, scopes, context),
            Command::Insert(insert) => self.resolve_insert(insert, temp, scopes, context),
            Command::Update(update) => {
                groups::resolve_group(self, &mut update.group, temp)?;
                scopes.push(vec![update.group.clone()]);
                let result = (|| {
                    for (target, value) in &mut update.set {
                        elements::resolve_element_against_group(target, &update.group)?;
                        self.resolve_expression(value, temp, scopes, context)?;
                        check_assignable(target.data_type(), value.result_type())?;
                    }
                    if let Some(criteria) = &mut update.r#where {
                        self.resolve_expression(criteria, temp, scopes, context)?;
                    }
                    Ok(())
                })();
                scopes.pop();
                result
            }
            Command::Delete(delete) => {
                groups::resolve_group(self, &mut delete.group, temp)?;
                scopes.push(vec![delete.group.clone()]);
                let result = match &mut delete.r#where {
                    Some(criteria) => self.resolve_expression(criteria, temp, scopes, context),
                    None => Ok(()),
                };
                scopes.pop();
                result
            }
            Command::Exec(procedure) => self.resolve_exec(procedure, temp, scopes, context),
        }
    }

    fn resolve_query(
        &self,
        query: &mut QueryCommand,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        match query {
            QueryCommand::Select(select) => self.resolve_select(select, temp, scopes, context),
            QueryCommand::SetQuery(set_query) => {
                self.resolve_query(&mut set_query.left, temp, scopes, context)?;
                self.resolve_query(&mut set_query.right, temp, scopes, context)?;
                // A trailing ORDER BY sees the projected output of the left
                // branch, not any group scope.
                let names = set_query.left.projected_names();
                let types = set_query.left.projected_types();
                for (expr, _) in &mut set_query.order_by {
                    elements::resolve_against_projection(expr, &names, &types)?;
                }
                Ok(())
            }
        }
    }

    fn resolve_select(
        &self,
        select: &mut Select,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        let scope = groups::resolve_from_clauses(self, &mut select.from, temp, context)?;
        groups::expand_all(select, &scope);
        scopes.push(scope);
        let result = (|| {
            for expr in select.expressions_mut() {
                self.resolve_expression(expr, temp, scopes, context)?;
            }
            Ok(())
        })();
        scopes.pop();
        result
    }

    /// Resolve one expression completely: element references against the
    /// scope stack, subquery containers recursively (seeing the enclosing
    /// scopes), then types bottom-up.
    fn resolve_expression(
        &self,
        expr: &mut Expression,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        elements::resolve_in_expression(expr, scopes)?;
        expr.transform(&mut |node| match node {
            Expression::ScalarSubquery(query) | Expression::ExistsSubquery(query) => {
                self.resolve_query(query, temp, scopes, context)
            }
            Expression::InSubquery { query, .. } => self.resolve_query(query, temp, scopes, context),
            _ => Ok(()),
        })?;
        typing::resolve_types(expr, self.library, &self.dialect, context)?;
        Ok(())
    }

    fn resolve_insert(
        &self,
        insert: &mut Insert,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        if insert.merge && !self.dialect.supports(Capability::MergeStatement) {
            return Err(Error::UnsupportedConstruct {
                construct: Capability::MergeStatement.construct_name().to_string(),
                version: self.dialect.version().to_string(),
            });
        }

        groups::resolve_group(self, &mut insert.group, temp)?;
        for column in &mut insert.columns {
            elements::resolve_element_against_group(column, &insert.group)?;
        }

        match &mut insert.source {
            InsertSource::Values(rows) => {
                let column_types: Vec<Option<DataType>> =
                    insert.columns.iter().map(|c| c.data_type()).collect();
                for row in rows {
                    for (index, expr) in row.iter_mut().enumerate() {
                        self.resolve_expression(expr, temp, scopes, context)?;
                        if let Some(target) = column_types.get(index) {
                            check_assignable(*target, expr.result_type())?;
                        }
                    }
                }
                Ok(())
            }
            InsertSource::Query(query) => self.resolve_query(query, temp, scopes, context),
        }
    }

    fn resolve_exec(
        &self,
        procedure: &mut StoredProcedure,
        temp: &mut TempMetadataStore,
        scopes: &mut ScopeStack,
        context: &mut CommandContext,
    ) -> Result<()> {
        let metadata = self
            .metadata
            .procedure(&procedure.name)?
            .ok_or_else(|| Error::UnresolvedProcedure(procedure.name.clone()))?;

        let inputs: Vec<DataType> = metadata.input_params().map(|p| p.data_type).collect();
        if procedure.args.len() != inputs.len() {
            return Err(Error::TypeMismatch {
                expected: format!("{} procedure arguments", inputs.len()),
                found: procedure.args.len().to_string(),
            });
        }
        for (arg, param_type) in procedure.args.iter_mut().zip(&inputs) {
            self.resolve_expression(arg, temp, scopes, context)?;
            check_assignable(Some(*param_type), arg.result_type())?;
        }

        // The result set becomes a pseudo-group so downstream references to
        // `proc.column` bind like any other group.
        if !metadata.result_set.is_empty() {
            let columns = metadata
                .result_set
                .iter()
                .map(|c| (c.name.clone(), c.data_type))
                .collect();
            let id = temp.add_temp_group(&procedure.name, columns, TempMetadataType::Virtual)?;
            let mut group = GroupSymbol::new(procedure.name.clone());
            group.set_binding(GroupBinding::Temp(id));
            procedure.result_group = Some(group);
        }
        procedure.resolved = Some(metadata);
        Ok(())
    }
}

/// A value of type `found` must be storable where `expected` is declared.
fn check_assignable(expected: Option<DataType>, found: Option<DataType>) -> Result<()> {
    match (expected, found) {
        (Some(expected), Some(found))
            if expected != found && !found.converts_implicitly_to(&expected) =>
        {
            Err(Error::TypeMismatch {
                expected: expected.to_string(),
                found: found.to_string(),
            })
        }
        _ => Ok(()),
    }
}
