//! Group resolution
//!
//! Binds every FROM item: catalog lookup first, the temporary registry
//! second, fatal error third. Derived tables resolve their body in a fresh
//! scope, then synthesize a VIRTUAL temporary identity mirroring the body's
//! projection.

use super::{Resolver, ScopeStack};
use crate::ast::{
    ElementBinding, ElementSymbol, Expression, FromClause, GroupBinding, GroupSymbol, Select,
};
use crate::context::CommandContext;
use crate::error::{Error, Result};
use crate::metadata::{TempMetadataStore, TempMetadataType};
use crate::types::DataType;
use tracing::trace;

/// Resolve every FROM item and return the scope the clause contributes.
/// Duplicate in-scope names are an error.
pub(super) fn resolve_from_clauses(
    resolver: &Resolver<'_>,
    from: &mut [FromClause],
    temp: &mut TempMetadataStore,
    context: &mut CommandContext,
) -> Result<Vec<GroupSymbol>> {
    let mut scope: Vec<GroupSymbol> = Vec::new();
    for item in from.iter_mut() {
        resolve_from_item(resolver, item, temp, context)?;
        for group in item.scope_groups() {
            if scope.iter().any(|existing| existing.matches(group.name())) {
                return Err(Error::DuplicateGroup(group.name().to_string()));
            }
            scope.push(group.clone());
        }
    }
    Ok(scope)
}

fn resolve_from_item(
    resolver: &Resolver<'_>,
    item: &mut FromClause,
    temp: &mut TempMetadataStore,
    context: &mut CommandContext,
) -> Result<()> {
    match item {
        FromClause::Group(group) => resolve_group(resolver, group, temp),
        FromClause::DerivedTable { query, group } => {
            // The body sees no enclosing scope: a derived table cannot be
            // correlated to its siblings.
            resolver.resolve_query(query, temp, &mut ScopeStack::new(), context)?;

            let columns = query
                .projected_names()
                .into_iter()
                .zip(query.projected_types())
                .map(|(name, data_type)| (name, data_type.unwrap_or(DataType::Null)))
                .collect();
            let id = match temp.add_temp_group(
                &group.canonical_name(),
                columns,
                TempMetadataType::Virtual,
            ) {
                Ok(id) => id,
                // The same alias may appear in sibling scopes; the identity
                // still binds, it just isn't registered twice.
                Err(Error::DuplicateGroup(_)) => {
                    let columns = query
                        .projected_names()
                        .into_iter()
                        .zip(query.projected_types())
                        .map(|(name, data_type)| (name, data_type.unwrap_or(DataType::Null)))
                        .collect();
                    TempMetadataStore::create_group_id(
                        &group.canonical_name(),
                        columns,
                        TempMetadataType::Virtual,
                    )
                }
                Err(error) => return Err(error),
            };
            id.set_query_definition((**query).clone());
            trace!(group = %id.id(), "bound derived table");
            group.set_binding(GroupBinding::Temp(id));
            Ok(())
        }
        FromClause::Join { left, right, .. } => {
            resolve_from_item(resolver, left, temp, context)?;
            resolve_from_item(resolver, right, temp, context)
        }
    }
}

/// Bind one named group: permanent catalog, then the temporary registry.
pub(super) fn resolve_group(
    resolver: &Resolver<'_>,
    group: &mut GroupSymbol,
    temp: &TempMetadataStore,
) -> Result<()> {
    let lookup = group.lookup_name().to_string();
    if let Some(table) = resolver.metadata.group(&lookup)? {
        trace!(group = %lookup, "bound catalog group");
        group.set_binding(GroupBinding::Catalog(table));
        return Ok(());
    }
    if let Some(id) = temp.temp_group(&lookup) {
        trace!(group = %lookup, "bound temporary group");
        group.set_binding(GroupBinding::Temp(id));
        return Ok(());
    }
    Err(Error::UnresolvedGroup(lookup))
}

/// Replace `*` projections with the scope's elements, in group order.
pub(super) fn expand_all(select: &mut Select, scope: &[GroupSymbol]) {
    if !select
        .select
        .iter()
        .any(|(expr, _)| matches!(expr, Expression::All))
    {
        return;
    }
    let mut expanded = Vec::with_capacity(select.select.len());
    for (expr, alias) in select.select.drain(..) {
        if matches!(expr, Expression::All) {
            for group in scope {
                for symbol in scope_elements(group) {
                    expanded.push((Expression::Element(symbol), None));
                }
            }
        } else {
            expanded.push((expr, alias));
        }
    }
    select.select = expanded;
}

/// The fully bound, qualified element symbols a resolved group contributes.
pub(super) fn scope_elements(group: &GroupSymbol) -> Vec<ElementSymbol> {
    let Some(binding) = group.binding() else {
        return Vec::new();
    };
    match binding {
        GroupBinding::Catalog(table) => table
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let mut symbol = ElementSymbol::qualified(group.clone(), column.name.clone());
                symbol.set_data_type(column.data_type);
                symbol.set_binding(ElementBinding::Catalog {
                    table: table.clone(),
                    column: index,
                });
                symbol
            })
            .collect(),
        GroupBinding::Temp(id) => id
            .elements()
            .iter()
            .map(|element| {
                let mut symbol = ElementSymbol::qualified(group.clone(), element.name());
                if let Some(data_type) = element.value_type() {
                    symbol.set_data_type(data_type);
                }
                symbol.set_binding(ElementBinding::Temp(element.clone()));
                symbol
            })
            .collect(),
    }
}
