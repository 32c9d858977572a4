//! Prompt composition and response cleanup.

use std::sync::LazyLock;

use regex::Regex;

use crate::request::{RepairRequest, RepairScope};

/// Whole lines that only open or close a markdown fence.
static FENCE_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[\w#+.-]*[ \t]*\r?$\n?").unwrap());

/// Syntax constraints every answer must respect.
pub const SYNTAX_REQUIREMENTS: &[&str] = &[
    "Fix logic in processes (guards, variable updates).",
    "Syntax: Exactly ONE '->' per transition. NO trailing semicolons after process calls.",
    "Only use variables and constants already defined in the model.",
];

/// Build the prompt for one repair request.
///
/// Sections: task, code, event rule, syntax requirements, output format.
pub fn compose_prompt(request: &RepairRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str("### TASK\n");
    match request.scope {
        RepairScope::Region => prompt.push_str(&format!(
            "Repair the following fragment of a PAT CSP# model (event '{}') so that the model \
             satisfies this property: {}\n",
            request.event, request.assertion
        )),
        RepairScope::WholeModel => prompt.push_str(&format!(
            "Repair the following PAT CSP# model to satisfy this property: {}\n",
            request.assertion
        )),
    }

    match request.scope {
        RepairScope::Region => prompt.push_str("\n### CODE FRAGMENT\n"),
        RepairScope::WholeModel => prompt.push_str("\n### FULL MODEL\n"),
    }
    prompt.push_str(request.code.trim_end());
    prompt.push('\n');

    if !request.rule.trim().is_empty() {
        prompt.push_str("\n### RULES\n");
        prompt.push_str(request.rule.trim_end());
        prompt.push('\n');
    }

    prompt.push_str("\n### REQUIREMENTS\n");
    for (idx, requirement) in SYNTAX_REQUIREMENTS.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", idx + 1, requirement));
    }
    let output = match request.scope {
        RepairScope::Region => {
            "Output: Return ONLY the corrected fragment, keeping its event name and guard. \
             No prose. No markdown."
        }
        RepairScope::WholeModel => "Output: Return the FULL corrected model. No prose. No markdown.",
    };
    prompt.push_str(&format!("{}. {}\n", SYNTAX_REQUIREMENTS.len() + 1, output));

    prompt
}

/// Strip markdown fences and surrounding whitespace from an oracle answer.
pub fn clean_response(raw: &str) -> String {
    let without_lines = FENCE_LINE_RE.replace_all(raw, "");
    without_lines
        .replace("```csp", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_prompt_sections() {
        let request = RepairRequest::region(
            "promote",
            "promote { x = 1; }",
            "Wrap updates in atomic{}.",
            "System() |= [] safe",
        );
        let prompt = compose_prompt(&request);
        assert!(prompt.starts_with("### TASK\n"));
        assert!(prompt.contains("(event 'promote')"));
        assert!(prompt.contains("### CODE FRAGMENT\npromote { x = 1; }\n"));
        assert!(prompt.contains("### RULES\nWrap updates in atomic{}.\n"));
        assert!(prompt.contains("Exactly ONE '->' per transition"));
        assert!(prompt.contains("4. Output: Return ONLY the corrected fragment"));
        assert!(prompt.contains("System() |= [] safe"));
    }

    #[test]
    fn test_whole_model_prompt() {
        let request = RepairRequest::whole_model("initialization", "var x = 0;", "", "P() |= <> done");
        let prompt = compose_prompt(&request);
        assert!(prompt.contains("### FULL MODEL\nvar x = 0;\n"));
        assert!(!prompt.contains("### RULES"));
        assert!(prompt.contains("Return the FULL corrected model"));
    }

    #[test]
    fn test_clean_response_strips_fences() {
        let raw = "```csp\npromote { x = 1; } -> P()\n```\n";
        assert_eq!(clean_response(raw), "promote { x = 1; } -> P()");
    }

    #[test]
    fn test_clean_response_inline_fences() {
        assert_eq!(clean_response("  ```e{} -> P()```  "), "e{} -> P()");
    }

    #[test]
    fn test_clean_response_keeps_plain_code() {
        let code = "var x = 0;\nvar y = 1;";
        assert_eq!(clean_response(&format!("\n{}\n\n", code)), code);
    }
}
