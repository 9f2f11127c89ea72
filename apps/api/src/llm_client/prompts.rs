// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing instruction appended to every prompt that expects a JSON object back.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Respond with ONLY the JSON object. No markdown, no code fences, no surrounding prose.";

/// Fills `{name}` placeholders in a single pass over `template`.
///
/// Substituted values are never rescanned, so user text containing `{name}`
/// sequences cannot pull another value into the prompt. Braces that do not
/// form a known placeholder (JSON examples) are copied through unchanged.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(
        template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>(),
    );
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let matched = vars.iter().find_map(|(name, value)| {
            let placeholder_len = name.len() + 2;
            let is_match = tail.len() >= placeholder_len
                && tail.as_bytes()[placeholder_len - 1] == b'}'
                && &tail[1..placeholder_len - 1] == *name;
            is_match.then_some((placeholder_len, *value))
        });
        match matched {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_known_placeholders() {
        let out = render_template("Hello {name}, role: {role}.", &[("name", "Jane"), ("role", "SRE")]);
        assert_eq!(out, "Hello Jane, role: SRE.");
    }

    #[test]
    fn test_render_keeps_json_braces() {
        let template = "{\n  \"score\": <number>\n}\n{body}";
        let out = render_template(template, &[("body", "text")]);
        assert_eq!(out, "{\n  \"score\": <number>\n}\ntext");
    }

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        let out = render_template("{a}|{b}", &[("a", "{b}"), ("b", "secret")]);
        assert_eq!(out, "{b}|secret");
    }

    #[test]
    fn test_render_handles_multibyte_text_near_braces() {
        let out = render_template("é{x}é{", &[("x", "ü")]);
        assert_eq!(out, "éüé{");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        assert_eq!(render_template("{unknown}", &[("x", "y")]), "{unknown}");
    }
}
