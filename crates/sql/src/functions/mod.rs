//! Function metadata and overload resolution
//!
//! The library is an explicit object handed to the resolver by the caller,
//! scoped to a catalog deployment. Built-in methods come pre-registered;
//! user-defined functions are added on top and validated separately by the
//! validator.

use crate::context::Determinism;
use crate::dialect::{Capability, Dialect};
use crate::error::{Error, Result};
use crate::types::DataType;
use std::collections::HashMap;

/// Where a function method comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    Builtin,
    UserDefined,
}

/// One declared parameter of a function method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: String,
    pub data_type: DataType,
}

/// One concrete signature of a function. A name may have several methods;
/// they are kept in declaration order, which breaks overload ties.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionMethod {
    pub name: String,
    pub kind: FunctionKind,
    /// Grouping category, e.g. "String" or "Numeric". Required for UDFs.
    pub category: Option<String>,
    /// Implementation class for UDFs.
    pub invocation_class: Option<String>,
    /// Implementation method for UDFs.
    pub invocation_method: Option<String>,
    pub params: Vec<FunctionParameter>,
    pub returns: DataType,
    pub determinism: Determinism,
    /// Whether the final parameter repeats. Invoking the repeated form is
    /// dialect-gated.
    pub variadic: bool,
}

impl FunctionMethod {
    /// A deterministic built-in with positional parameter names.
    pub fn builtin(name: impl Into<String>, arg_types: &[DataType], returns: DataType) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::Builtin,
            category: None,
            invocation_class: None,
            invocation_method: None,
            params: arg_types
                .iter()
                .enumerate()
                .map(|(index, data_type)| FunctionParameter {
                    name: format!("arg{}", index + 1),
                    data_type: *data_type,
                })
                .collect(),
            returns,
            determinism: Determinism::Deterministic,
            variadic: false,
        }
    }

    pub fn with_determinism(mut self, determinism: Determinism) -> Self {
        self.determinism = determinism;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// A user-defined function shell; completeness is checked by the
    /// validator, not at registration.
    pub fn user_defined(
        name: impl Into<String>,
        params: Vec<FunctionParameter>,
        returns: DataType,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FunctionKind::UserDefined,
            category: None,
            invocation_class: None,
            invocation_method: None,
            params,
            returns,
            determinism: Determinism::Deterministic,
            variadic: false,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_invocation(
        mut self,
        class: impl Into<String>,
        method: impl Into<String>,
    ) -> Self {
        self.invocation_class = Some(class.into());
        self.invocation_method = Some(method.into());
        self
    }

    /// How this method matches the given argument types, if it does.
    /// `None` argument types (parameters, unresolved) match anything at no
    /// cost.
    fn match_cost(&self, arg_types: &[Option<DataType>]) -> Option<MatchCost> {
        let fixed = if self.variadic {
            self.params.len().saturating_sub(1)
        } else {
            self.params.len()
        };
        let variadic_form = if self.variadic {
            arg_types.len() != self.params.len()
        } else {
            false
        };
        if self.variadic {
            if arg_types.len() < fixed {
                return None;
            }
        } else if arg_types.len() != fixed {
            return None;
        }

        let mut conversions = 0usize;
        for (index, arg_type) in arg_types.iter().enumerate() {
            let param_type = if index < fixed {
                self.params[index].data_type
            } else {
                self.params.last()?.data_type
            };
            // A parameter declared with the NULL type accepts any argument.
            if param_type == DataType::Null {
                continue;
            }
            match arg_type {
                None => {}
                Some(arg_type) if *arg_type == param_type => {}
                Some(arg_type) if arg_type.converts_implicitly_to(&param_type) => {
                    conversions += 1;
                }
                Some(_) => return None,
            }
        }
        Some(MatchCost {
            conversions,
            variadic_form,
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct MatchCost {
    conversions: usize,
    variadic_form: bool,
}

/// The functions known to one resolution pass, keyed case-insensitively.
#[derive(Debug, Default)]
pub struct FunctionLibrary {
    methods: HashMap<String, Vec<FunctionMethod>>,
}

impl FunctionLibrary {
    /// An empty library.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard built-in methods.
    pub fn with_builtins() -> Self {
        use DataType::*;

        let mut library = Self::empty();
        // String
        library.add(FunctionMethod::builtin("LENGTH", &[String], Integer));
        library.add(FunctionMethod::builtin("UCASE", &[String], String));
        library.add(FunctionMethod::builtin("LCASE", &[String], String));
        library.add(FunctionMethod::builtin("CONCAT", &[String, String], String));
        library.add(FunctionMethod::builtin(
            "SUBSTRING",
            &[String, Integer],
            String,
        ));
        library.add(FunctionMethod::builtin(
            "SUBSTRING",
            &[String, Integer, Integer],
            String,
        ));
        // Numeric; overloads declared narrowest first so exact matches win
        // and ties resolve toward the narrower signature.
        library.add(FunctionMethod::builtin("ABS", &[Integer], Integer));
        library.add(FunctionMethod::builtin("ABS", &[BigInt], BigInt));
        library.add(FunctionMethod::builtin("ABS", &[Decimal], Decimal));
        library.add(FunctionMethod::builtin("ABS", &[Double], Double));
        library.add(FunctionMethod::builtin("ROUND", &[Decimal, Integer], Decimal));
        library.add(FunctionMethod::builtin("ROUND", &[Double, Integer], Double));
        library.add(FunctionMethod::builtin("GREATEST", &[Integer], Integer).variadic());
        library.add(FunctionMethod::builtin("LEAST", &[Integer], Integer).variadic());
        // Aggregates; COUNT's NULL-typed parameter accepts any argument.
        library.add(FunctionMethod::builtin("COUNT", &[Null], BigInt));
        library.add(FunctionMethod::builtin("SUM", &[BigInt], BigInt));
        library.add(FunctionMethod::builtin("SUM", &[Double], Double));
        library.add(FunctionMethod::builtin("AVG", &[Double], Double));
        for aggregate in ["MIN", "MAX"] {
            library.add(FunctionMethod::builtin(aggregate, &[Integer], Integer));
            library.add(FunctionMethod::builtin(aggregate, &[BigInt], BigInt));
            library.add(FunctionMethod::builtin(aggregate, &[Double], Double));
            library.add(FunctionMethod::builtin(aggregate, &[String], String));
            library.add(FunctionMethod::builtin(aggregate, &[Timestamp], Timestamp));
        }
        // Temporal
        library.add(
            FunctionMethod::builtin("NOW", &[], Timestamp)
                .with_determinism(Determinism::CommandDeterministic),
        );
        library.add(
            FunctionMethod::builtin("CURDATE", &[], Date)
                .with_determinism(Determinism::CommandDeterministic),
        );
        library.add(FunctionMethod::builtin(
            "FORMATTIMESTAMP",
            &[Timestamp, String],
            String,
        ));
        // System
        library.add(
            FunctionMethod::builtin("RAND", &[], Double)
                .with_determinism(Determinism::Nondeterministic),
        );
        library.add(
            FunctionMethod::builtin("RAND", &[BigInt], Double)
                .with_determinism(Determinism::Nondeterministic),
        );
        library
    }

    /// Register a method. Later registrations of a name rank after earlier
    /// ones for tie-breaking.
    pub fn add(&mut self, method: FunctionMethod) {
        self.methods
            .entry(method.name.to_ascii_uppercase())
            .or_default()
            .push(method);
    }

    /// All methods registered under `name`, in declaration order.
    pub fn overloads(&self, name: &str) -> &[FunctionMethod] {
        self.methods
            .get(&name.to_ascii_uppercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every registered method.
    pub fn methods(&self) -> impl Iterator<Item = &FunctionMethod> {
        self.methods.values().flatten()
    }

    /// Pick the method for a call: exact signature match first, then the
    /// fewest implicit conversions, ties broken by declaration order. A
    /// call that only matches through a variadic form requires the dialect
    /// capability.
    pub fn resolve(
        &self,
        name: &str,
        arg_types: &[Option<DataType>],
        dialect: &Dialect,
    ) -> Result<&FunctionMethod> {
        let mut best: Option<(&FunctionMethod, usize)> = None;
        let mut variadic_blocked = false;

        for method in self.overloads(name) {
            let Some(cost) = method.match_cost(arg_types) else {
                continue;
            };
            if cost.variadic_form && !dialect.supports(Capability::VariadicFunctions) {
                variadic_blocked = true;
                continue;
            }
            let better = match best {
                None => true,
                Some((_, best_conversions)) => cost.conversions < best_conversions,
            };
            if better {
                best = Some((method, cost.conversions));
            }
        }

        if let Some((method, _)) = best {
            return Ok(method);
        }
        if variadic_blocked {
            return Err(Error::UnsupportedConstruct {
                construct: Capability::VariadicFunctions.construct_name().to_string(),
                version: dialect.version().to_string(),
            });
        }
        Err(Error::UnresolvedFunction {
            name: name.to_string(),
            arg_types: arg_types
                .iter()
                .map(|t| match t {
                    Some(t) => t.to_string(),
                    None => "?".to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}
