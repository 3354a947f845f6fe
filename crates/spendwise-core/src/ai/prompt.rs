//! Prompt construction for expense classification

use super::types::ClassificationRequest;

/// Build the classification prompt sent to text-generation backends
pub fn classification_prompt(request: &ClassificationRequest) -> String {
    format!(
        r#"You are an assistant that categorizes personal financial expense transactions.
Infer the meaning of categories only from their names. Do not assume predefined meanings.
Choose the most semantically appropriate category, and only from the available categories.

Respond ONLY with a JSON object in the exact format:
{{"categoryName": "...", "confidence": 0.0, "reason": "..."}}

Notes:
- If the transaction clearly refers to a digital game or gaming platform (Steam, Xbox, PlayStation), choose the closest category such as Gaming if available.
- If unclear, pick the closest category and report a low confidence.

Transaction:
Amount: {}
Merchant: {}
Description: {}
Available Categories: [{}]
"#,
        request.amount,
        request.merchant,
        request.description.as_deref().unwrap_or(""),
        request.categories.join(", ")
    )
}
