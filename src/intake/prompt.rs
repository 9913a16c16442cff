use crate::models::SubmissionFields;

/// Upper bound on document characters sent to the model.
pub const MAX_PROMPT_CHARS: usize = 12_000;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are an underwriting intake assistant. \
Extract the requested fields from the provided text. \
Return JSON ONLY with the listed keys. \
Use empty string for unknown fields. Do not add extra keys. \
Guidelines: \
- Producer name is the insurance agency/broker submitting the quote request. \
- Insured name is the business/property owner being insured. \
- Contact info (name, phone, email) is for the person submitting or managing the application. \
- Location address is the property being insured (split street number from street name). \
- Building limit is the TIV (Total Insured Value) for the property. \
- Additional limits: Rents = Business Income, Ordinance = Increased Cost of Construction. \
- Construction types: Frame, Joisted Masonry, Non-Combustible, Masonry Non-Combustible, \
Modified Fire Resistive, Fire Resistive. \
- Keep all monetary values as strings with commas (e.g., '1,000,000'). \
- For dates, prefer MM/DD/YYYY format.";

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// User message listing the fields followed by the (truncated) document.
pub fn build_extraction_prompt(text: &str) -> String {
    format!(
        "Extract these fields: {}. Return a JSON object with exactly these keys. Document text:\n{}",
        SubmissionFields::NAMES.join(", "),
        truncate_chars(text, MAX_PROMPT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn prompt_lists_every_field() {
        let prompt = build_extraction_prompt("ACORD 140");
        for name in SubmissionFields::NAMES {
            assert!(prompt.contains(name), "{name}");
        }
        assert!(prompt.ends_with("Document text:\nACORD 140"));
    }
}
