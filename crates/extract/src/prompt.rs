pub fn build_recognition_prompt(text: &str) -> String {
    format!(
        r#"Tag the named entities in the following document text.

INSTRUCTIONS:
1. Find every named entity span in the text
2. Copy each span exactly as it appears in the text
3. List entities in the order they appear
4. Output ONLY valid JSON, nothing else

SCHEMA:
{{
  "entities": [
    {{"text": "exact span from the text", "label": "LABEL"}}
  ]
}}

LABELS:
PERSON, NORP, FAC, ORG, GPE, LOC, PRODUCT, EVENT, WORK_OF_ART, LAW, LANGUAGE,
DATE, TIME, PERCENT, MONEY, QUANTITY, ORDINAL, CARDINAL

RULES:
- For MONEY, copy only the amount as written, without the currency symbol
- Repeated mentions are listed every time they occur
- If there are no entities, output {{"entities": []}}
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{}

JSON OUTPUT:"#,
        text
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
