//! Prompt text sent to the model by each role

use specsmith_llm::ChatMessage;
use specsmith_types::PackageResult;

pub fn architect(spec: &str) -> String {
    format!(
        "Build an app for this specification: <spec>{}</spec>. Make a plan for the directory \
        structure you'll need, then return each file in full. Don't supply any reasoning, just \
        code.",
        spec
    )
}

pub fn coder(spec: &str, code: &str, review: &str) -> String {
    format!(
        "We need to improve code that should implement this specification: <spec>{}</spec>. Here \
        is the current code: <code>{}</code>. And here is a review of the code: \
        <review>{}</review>. Improve the code based on the review, keep the specification in mind, \
        and return the full updated code. Don't supply any reasoning, just code.",
        spec, code, review
    )
}

pub fn reviewer(code: &str, spec: &str) -> String {
    format!(
        "Review this code: <code>{}</code>. Check if the code quality and whether it correctly \
        implements this specification: <spec>{}</spec>. If you're satisfied, just return 'Looks \
        great', nothing else. If not, return a review with a list of changes you'd like to see.",
        code, spec
    )
}

/// System and user messages asking for the file list as JSON
pub fn packager(code: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are an expert in extracting single files (path and content) from one large \
            string.\n\nGenerate a valid JSON following the given schema below:\n\n{}",
            PackageResult::schema()
        )),
        ChatMessage::user(format!("Here is the large string: \n------\n{}\n------", code)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use specsmith_llm::Role;

    #[test]
    fn test_prompts_embed_inputs() {
        let prompt = coder("a todo app", "let x = 1;", "rename x");
        assert!(prompt.contains("<spec>a todo app</spec>"));
        assert!(prompt.contains("<code>let x = 1;</code>"));
        assert!(prompt.contains("<review>rename x</review>"));

        assert!(architect("spec")
            .starts_with("Build an app for this specification: <spec>spec</spec>."));
        assert!(reviewer("code", "spec").contains("just return 'Looks great', nothing else"));
    }

    #[test]
    fn test_packager_messages_carry_schema() {
        let messages = packager("fn main() {}");
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("\"required\":[\"path\",\"content\"]"));
        assert_eq!(messages[1].content, "Here is the large string: \n------\nfn main() {}\n------");
    }
}
