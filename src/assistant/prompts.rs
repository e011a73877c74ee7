use super::ContextDoc;

/// Sentence the model is told to use when the documentation is silent.
/// `Confidence::of` looks for it.
pub const NOT_IN_DOCS: &str = "This information is not available in the current documentation";

const ANSWER_INSTRUCTIONS: &str = r#"INSTRUCTIONS:

1. Accuracy
   - Answer ONLY from the documentation above.
   - If the documentation does not cover the question, say exactly: "{not_in_docs}".
   - Never invent endpoints, fields, or error codes.

2. Structure
   - Open with a direct answer.
   - Then give, where the documentation has them: API name and purpose, HTTP method,
     full endpoint, required and optional parameters with types, request body fields,
     response fields, error codes.

3. Field details
   - For every field: name, type, required or optional, meaning, allowed values, example.
   - Show complete JSON request bodies when the documentation provides them.

4. Formatting
   - **bold** for API and field names, `code` for endpoints, parameters and JSON.
   - Bullet lists for options, numbered lists for sequential steps.
   - > blockquotes for warnings.

5. Routing hints
   - "rooms and rates": Get Rooms and Rates or Direct Rooms and Rates API.
   - "booking": Book API with the full request body.
   - "cancel": Cancel API.
   - "search": Search API.
   - "static content" / "hotel content": Static Content API.
   - "field" / "parameter": field specifications from the reference pages.
   - Mention related APIs and error codes when relevant.
"#;

const EXPLAIN_INSTRUCTIONS: &str = r#"INSTRUCTIONS:

1. Identify the error
   - Extract the numeric error code (for example 4001, 4004, 5000).
   - Find it in the error code tables of the documentation and quote its exact message.
   - If it is not there, say exactly: "{not_in_docs}".

2. Answer in three parts

   **Summary** (1-2 sentences): what the error means and when it occurs.

   **Details** (3-5 bullet points):
   - root cause
   - common triggering scenarios
   - what went wrong in the request or response
   - impact on the booking flow
   - related error codes

   **Recommended Actions** (3-5 bullet points):
   - immediate fix
   - how to prevent it
   - what to check in the request
   - when to contact support, with the correlationId

3. Known codes
   - **4001**: request validation failed; check the fields[] array in the response.
   - **4004**: sold out; suggest other dates or hotels.
   - **4005**: price changed; a new search is required.
   - **4006**: rate expired; the token has timed out.
   - **4007**: duplicate booking; explain idempotency.
   - **5000-5004**: system or supplier failure; contact support with the correlationId.

4. State whether it is a client error (4xxx) or a server error (5xxx).
"#;

fn render_context(docs: &[ContextDoc]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, d)| format!("[Document {}]\n{}", i + 1, d.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

pub fn answer_prompt(question: &str, docs: &[ContextDoc]) -> String {
    format!(
        "You are a ZentrumHub Hotel API expert. Give accurate, complete and actionable answers \
         based only on the official documentation.\n\n\
         DOCUMENTATION:\n{}\n\n\
         QUESTION: {}\n\n\
         {}\n\
         ANSWER:",
        render_context(docs),
        question,
        ANSWER_INSTRUCTIONS.replace("{not_in_docs}", NOT_IN_DOCS),
    )
}

pub fn explain_prompt(error_content: &str, docs: &[ContextDoc]) -> String {
    format!(
        "You are a ZentrumHub Hotel API error diagnostics expert. Explain the error below and \
         tell the developer how to fix it.\n\n\
         DOCUMENTATION:\n{}\n\n\
         ERROR: {}\n\n\
         {}\n\
         EXPLANATION:",
        render_context(docs),
        error_content,
        EXPLAIN_INSTRUCTIONS.replace("{not_in_docs}", NOT_IN_DOCS),
    )
}
