//! Element resolution
//!
//! Binds element references against the groups in scope and rewrites them
//! into fully qualified `group.element` form. The rewrite is idempotent: a
//! qualified reference re-resolves to the same binding.

use super::ScopeStack;
use crate::ast::{ElementBinding, ElementSymbol, Expression, GroupBinding, GroupSymbol};
use crate::error::{Error, Result};
use crate::types::DataType;

/// Resolve every element reference in one expression tree. Subquery
/// containers' inner commands are not entered; the resolver descends into
/// them with their own scope.
pub(super) fn resolve_in_expression(expr: &mut Expression, scopes: &ScopeStack) -> Result<()> {
    expr.transform(&mut |node| {
        if let Expression::Element(symbol) = node {
            resolve_element(symbol, scopes)?;
        }
        Ok(())
    })
}

/// Resolve one element reference against the scope stack, innermost scope
/// first.
pub(super) fn resolve_element(symbol: &mut ElementSymbol, scopes: &ScopeStack) -> Result<()> {
    if let Some(qualifier) = symbol.group().map(|g| g.name().to_string()) {
        for scope in scopes.inner_out() {
            if let Some(group) = scope.iter().find(|g| g.matches(&qualifier)) {
                return bind_to_group(symbol, group);
            }
        }
        return Err(Error::UnresolvedGroup(qualifier));
    }

    for scope in scopes.inner_out() {
        let candidates: Vec<&GroupSymbol> = scope
            .iter()
            .filter(|group| declares(group, symbol.short_name()))
            .collect();
        match candidates.len() {
            0 => continue,
            1 => return bind_to_group(symbol, candidates[0]),
            _ => {
                return Err(Error::AmbiguousElement {
                    name: symbol.short_name().to_string(),
                    groups: candidates
                        .iter()
                        .map(|group| group.name().to_string())
                        .collect(),
                });
            }
        }
    }
    Err(Error::UnresolvedElement(symbol.short_name().to_string()))
}

/// Resolve an element that must belong to a specific group (an INSERT
/// target column or UPDATE change target).
pub(super) fn resolve_element_against_group(
    symbol: &mut ElementSymbol,
    group: &GroupSymbol,
) -> Result<()> {
    if let Some(qualifier) = symbol.group()
        && !group.matches(qualifier.name())
    {
        return Err(Error::UnresolvedElement(symbol.qualified_name()));
    }
    bind_to_group(symbol, group)
}

/// Resolve a set-query ORDER BY expression against the projected output of
/// the left branch.
pub(super) fn resolve_against_projection(
    expr: &mut Expression,
    names: &[String],
    types: &[Option<DataType>],
) -> Result<()> {
    expr.transform(&mut |node| {
        if let Expression::Element(symbol) = node {
            let position = names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(symbol.short_name()))
                .ok_or_else(|| Error::UnresolvedElement(symbol.short_name().to_string()))?;
            if let Some(data_type) = types.get(position).copied().flatten() {
                symbol.set_data_type(data_type);
            }
        }
        Ok(())
    })
}

fn declares(group: &GroupSymbol, name: &str) -> bool {
    group
        .binding()
        .map(|binding| binding.column_type(name).is_some())
        .unwrap_or(false)
}

fn bind_to_group(symbol: &mut ElementSymbol, group: &GroupSymbol) -> Result<()> {
    let binding = group
        .binding()
        .ok_or_else(|| Error::Internal(format!("group {} is not bound", group.name())))?;
    match binding {
        GroupBinding::Catalog(table) => {
            let (index, column) = table
                .column(symbol.short_name())
                .ok_or_else(|| Error::UnresolvedElement(symbol.qualified_name()))?;
            symbol.set_data_type(column.data_type);
            symbol.set_binding(ElementBinding::Catalog {
                table: table.clone(),
                column: index,
            });
        }
        GroupBinding::Temp(id) => {
            let element = id
                .element_by_name(symbol.short_name())
                .ok_or_else(|| Error::UnresolvedElement(symbol.qualified_name()))?;
            if let Some(data_type) = element.value_type() {
                symbol.set_data_type(data_type);
            }
            symbol.set_binding(ElementBinding::Temp(element));
        }
    }
    symbol.set_group(group.clone());
    Ok(())
}
