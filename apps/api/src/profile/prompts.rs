// All LLM prompt constants and prompt building for profile generation.

use serde_json::Value;

/// Base system instruction for profile generation. Establishes JSON-only
/// output, tone, grounding, and the placeholder policy for missing details.
pub const PROFILE_SYSTEM_PROMPT: &str = "\
You are a senior HR business partner who drafts job profiles for recruiters and hiring managers.
Produce only valid JSON - no markdown, code fences, or prose outside the JSON object.
Guidelines:
- Mirror the schema exactly; keep every key present once and avoid extra fields.
- Use concise, inclusive, and professional language suited for job descriptions.
- Ground every detail strictly in the user's instructions. Do not infer employers, brands, tools, budgets, or numbers that were not supplied.
- If a detail is missing:
  * For string fields, set the value to \"Not specified\".
  * For numeric fields, set the value to null.
  * For arrays or objects, leave them empty unless the user explicitly lists items.
- Align tone and structure with scenario cues (e.g., urgent hiring, graduate roles, leadership positions, multi-location teams).
- Respect all quantitative constraints such as budgets, years of experience, headcount, and locations.
- When the prompt contains conflicting information, prioritise the latest explicit directive and keep the rest consistent.
- Highlight practical next steps (like interview process or onboarding expectations) only when the schema includes relevant fields.
- Never expose reasoning or instructions; return the final JSON object only.";

/// Corrective reminder appended to the transcript after a response fails
/// JSON decoding.
pub const JSON_REMINDER: &str = "Reminder: respond with strictly valid JSON that matches the \
    required structure. Do not include commentary or code fences.";

/// Create the system prompt guiding the LLM output.
///
/// Pure and deterministic; the optional schema is embedded as indented JSON
/// text with an instruction to mirror it exactly.
pub fn build_system_prompt(schema: Option<&Value>) -> String {
    let mut prompt = PROFILE_SYSTEM_PROMPT.to_string();
    if let Some(schema) = schema {
        let schema_json =
            serde_json::to_string_pretty(schema).expect("JSON values always serialize");
        prompt.push_str("\nUse this JSON template and fill every field thoughtfully:\n");
        prompt.push_str(&schema_json);
        prompt.push_str("\nReplace placeholders with content that follows the guidelines above.");
    }
    prompt
}
