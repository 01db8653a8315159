use std::sync::OnceLock;

use regex::Regex;

/// Expand `{{ env.VAR }}` placeholders in raw TOML text
///
/// A fallback can be given with `{{ env.VAR | default("value") }}`; it is
/// used only when the variable is unset. Comment lines are copied through
/// untouched so commented-out secrets never have to exist.
pub fn expand_env(input: &str) -> Result<String, String> {
    fn placeholder() -> &'static Regex {
        static RE: OnceLock<Regex> = OnceLock::new();
        // 1: scoped key, 2: optional default("...") argument
        RE.get_or_init(|| {
            Regex::new(r#"\{\{\s*([a-zA-Z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
                .expect("must be valid regex")
        })
    }

    let mut lines = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_owned());
            continue;
        }

        let mut expanded = String::with_capacity(line.len());
        let mut cursor = 0;

        for captures in placeholder().captures_iter(line) {
            let (Some(whole), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };

            expanded.push_str(&line[cursor..whole.start()]);
            expanded.push_str(&resolve(key.as_str(), captures.get(2).map(|m| m.as_str()))?);
            cursor = whole.end();
        }

        expanded.push_str(&line[cursor..]);
        lines.push(expanded);
    }

    let mut output = lines.join("\n");
    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

/// Resolve a single `env.NAME` key
fn resolve(key: &str, default: Option<&str>) -> Result<String, String> {
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        return Err(format!("only variables scoped with 'env.' are supported: `{key}`"));
    };

    match (std::env::var(name), default) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(fallback)) => Ok(fallback.to_owned()),
        (Err(_), None) => Err(format!("environment variable not found: `{name}`")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_without_placeholders_is_unchanged() {
        let input = "origin_url = \"http://localhost:5050\"\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_registry_secret() {
        temp_env::with_var("TOLLGATE_TEST_SECRET", Some("sk_live_1"), || {
            let result = expand_env("secret_key = \"{{ env.TOLLGATE_TEST_SECRET }}\"").unwrap();
            assert_eq!(result, "secret_key = \"sk_live_1\"");
        });
    }

    #[test]
    fn expands_several_variables_across_lines() {
        let vars = [("PLAN_A", Some("sc_a")), ("PLAN_B", Some("sc_b"))];
        temp_env::with_vars(vars, || {
            let result = expand_env("a = \"{{ env.PLAN_A }}\"\nb = \"{{env.PLAN_B}}\"").unwrap();
            assert_eq!(result, "a = \"sc_a\"\nb = \"sc_b\"");
        });
    }

    #[test]
    fn missing_variable_is_an_error() {
        temp_env::with_var_unset("TOLLGATE_MISSING", || {
            let err = expand_env("key = \"{{ env.TOLLGATE_MISSING }}\"").unwrap_err();
            assert!(err.contains("TOLLGATE_MISSING"));
        });
    }

    #[test]
    fn default_applies_only_when_unset() {
        temp_env::with_var_unset("TOLLGATE_OPTIONAL", || {
            let result = expand_env("k = \"{{ env.TOLLGATE_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "k = \"fallback\"");
        });
        temp_env::with_var("TOLLGATE_OPTIONAL", Some("set"), || {
            let result = expand_env("k = \"{{ env.TOLLGATE_OPTIONAL | default(\"fallback\") }}\"").unwrap();
            assert_eq!(result, "k = \"set\"");
        });
    }

    #[test]
    fn comments_are_not_expanded() {
        temp_env::with_var_unset("TOLLGATE_MISSING", || {
            let input = "  # secret = \"{{ env.TOLLGATE_MISSING }}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn unscoped_keys_are_rejected() {
        let err = expand_env("key = \"{{ vault.SECRET }}\"").unwrap_err();
        assert!(err.contains("only variables scoped with 'env.'"));
    }
}
