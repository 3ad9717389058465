use serde_json::Value;

use crate::decl::{ArgDecl, Arity, FlagDecl, PositionalDecl, Registry};

fn format_value_name(id: &str) -> String {
    id.to_ascii_uppercase().replace('-', "_")
}

fn format_default(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_positional_left(decl: &PositionalDecl) -> String {
    let n = format_value_name(&decl.id);
    let repeat = match decl.count {
        Arity::Exact(1) => "",
        Arity::Exact(_) | Arity::Greedy => "...",
    };
    if decl.minimum > 0 {
        format!("<{n}>{repeat}")
    } else {
        format!("[{n}]{repeat}")
    }
}

fn format_positional_help(decl: &PositionalDecl) -> String {
    let mut out = decl.help.trim().to_string();
    let count = match decl.count {
        Arity::Exact(1) => None,
        Arity::Exact(n) => Some(format!("[count: {n}]")),
        Arity::Greedy => Some("[count: *]".to_string()),
    };
    for note in count.into_iter().chain(
        (decl.minimum > 0).then(|| format!("[minimum: {}]", decl.minimum)),
    ) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&note);
    }
    out
}

fn format_flag_left(decl: &FlagDecl) -> String {
    format!("-{}", decl.id)
}

fn format_arg_left(decl: &ArgDecl) -> String {
    format!("--{} <{}>", decl.id, format_value_name(&decl.id))
}

fn format_arg_help(decl: &ArgDecl) -> String {
    let mut out = decl.help.trim().to_string();
    if decl.required {
        if out.is_empty() {
            out.push_str("required");
        } else {
            out.push_str(" (required)");
        }
    }
    if let Some(default_value) = &decl.default {
        let default_value = format_default(default_value);
        if out.is_empty() {
            out.push_str(&format!("[default: {default_value}]"));
        } else {
            out.push_str(&format!(" [default: {default_value}]"));
        }
    }
    out
}

fn push_rows(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }
}

/// Render usage text for `registry`.
pub(crate) fn usage(name: &str, registry: &Registry) -> String {
    let mut out = String::new();
    out.push_str(&format!("Usage: {name}"));

    let has_options = registry.flags().next().is_some() || registry.args().next().is_some();
    if has_options {
        out.push_str(" [OPTIONS]");
    }
    for decl in registry.positionals() {
        out.push(' ');
        out.push_str(&format_positional_left(decl));
    }
    out.push('\n');

    let positionals: Vec<(String, String)> = registry
        .positionals()
        .iter()
        .map(|d| (format_positional_left(d), format_positional_help(d)))
        .collect();
    push_rows(&mut out, "Arguments", positionals);

    let options: Vec<(String, String)> = registry
        .flags()
        .map(|d| (format_flag_left(d), d.help.trim().to_string()))
        .chain(
            registry
                .args()
                .map(|d| (format_arg_left(d), format_arg_help(d))),
        )
        .collect();
    push_rows(&mut out, "Options", options);

    out
}
