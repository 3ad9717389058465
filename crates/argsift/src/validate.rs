//! Post-scan validation: turns the raw scan output into frozen [`Matches`]
//! or the errors found in it.

use indexmap::IndexMap;
use serde_json::Value;

use crate::decl::Registry;
use crate::engine::{Collected, Options};
use crate::error::{Error, Result};
use crate::matches::Matches;

pub(crate) fn validate(
    options: Options,
    registry: Registry,
    collected: Collected,
) -> Result<Matches> {
    let Collected {
        flags: raw_flags,
        args: raw_args,
        positionals: raw_positionals,
        leftovers,
    } = collected;

    let mut errors: Vec<Error> = Vec::new();

    let mut args: IndexMap<String, Vec<Value>> = IndexMap::with_capacity(raw_args.len());
    for (name, values) in raw_args {
        let mut ok = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Ok(v) => ok.push(v),
                Err(e) => errors.push(e),
            }
        }
        args.insert(name, ok);
    }

    let mut flags: IndexMap<char, usize> = IndexMap::with_capacity(raw_flags.len());
    for (c, count) in raw_flags {
        match count {
            Ok(n) => {
                flags.insert(c, n);
            }
            Err(e) => errors.push(e),
        }
    }

    errors.extend(
        registry
            .args()
            .filter(|decl| decl.required && !args.contains_key(&decl.id))
            .map(|decl| Error::MissingArgument(decl.id.clone())),
    );

    let mut positionals: IndexMap<String, Value> = IndexMap::new();
    let mut reported_missing = false;
    for decl in registry.positionals() {
        let values = raw_positionals
            .get(&decl.id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if values.len() < decl.minimum && !reported_missing {
            errors.push(Error::MissingPositional);
            reported_missing = true;
        }

        match decl.parse_values(values) {
            Some(Ok(parsed)) => {
                positionals.insert(decl.id.clone(), parsed);
            }
            Some(Err(e)) => errors.push(e),
            None if !values.is_empty() => {
                positionals.insert(decl.id.clone(), raw_list(values));
            }
            None => {}
        }
    }

    if !options.allow_leftovers && !leftovers.is_empty() {
        errors.push(Error::ExtraPositionals(leftovers.clone()));
    }

    if let Some(err) = Error::from_collected(errors) {
        tracing::debug!(errors = err.errors().len(), "validation failed");
        return Err(err);
    }

    Ok(Matches::new(
        options,
        registry,
        flags,
        args,
        positionals,
        leftovers,
    ))
}

fn raw_list(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}
