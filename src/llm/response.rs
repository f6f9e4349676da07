use super::LlmError;
use crate::api::types::flexible_f64;
use serde::{Deserialize, Deserializer, Serialize};

/// Structured advice decoded from the model's reply
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdvisorResponse {
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    #[serde(default)]
    pub portfolio_suggestions: String,
    #[serde(default)]
    pub risk_warnings: Vec<String>,

    /// Reply text before JSON extraction
    #[serde(skip)]
    pub raw_response: String,
    #[serde(skip)]
    pub tokens_used: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, deserialize_with = "flexible_f64_or_zero")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "flexible_string", skip_serializing_if = "Option::is_none")]
    pub suggested_leverage: Option<String>,
    #[serde(default, deserialize_with = "flexible_string", skip_serializing_if = "Option::is_none")]
    pub suggested_size: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64", skip_serializing_if = "Option::is_none")]
    pub suggested_entry: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64", skip_serializing_if = "Option::is_none")]
    pub suggested_stop_loss: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64", skip_serializing_if = "Option::is_none")]
    pub suggested_take_profit: Option<f64>,
    #[serde(default)]
    pub risk_assessment: String,
}

fn flexible_f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(flexible_f64(deserializer)?.unwrap_or(0.0))
}

/// Strings stay strings, numbers become their text, null becomes `None`
fn flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Pull the JSON body out of a ```json fence, a plain fence holding an
/// object, or the trimmed text
pub fn extract_json(content: &str) -> &str {
    if let Some(start) = content.find("```json") {
        let body = &content[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    if let Some(start) = content.find("```") {
        let body = &content[start + 3..];
        if let Some(end) = body.find("```") {
            let extracted = body[..end].trim();
            if extracted.starts_with('{') {
                return extracted;
            }
        }
    }

    content.trim()
}

/// Decode the model reply, keeping the raw text and token count
pub fn parse_advisor_response(content: &str, tokens_used: u64) -> Result<AdvisorResponse, LlmError> {
    let json = extract_json(content);

    let mut response: AdvisorResponse =
        serde_json::from_str(json).map_err(|source| LlmError::Parse {
            source,
            raw: content.to_string(),
        })?;

    response.raw_response = content.to_string();
    response.tokens_used = tokens_used;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "analysis": "Range-bound majors",
        "recommendations": [{
            "symbol": "BTC/USDC:USDC",
            "action": "HOLD",
            "reasoning": "Trend intact above 4h EMA50",
            "confidence": 0.65,
            "suggested_leverage": "10x",
            "suggested_size": 0.25,
            "suggested_entry": null,
            "suggested_stop_loss": "95000",
            "suggested_take_profit": 112000.5,
            "risk_assessment": "MEDIUM"
        }],
        "portfolio_suggestions": "Keep cash above 30%",
        "risk_warnings": ["Funding elevated on SOL"]
    }"#;

    #[test]
    fn test_extract_json_fence() {
        let content = format!("Here you go:\n```json\n{}\n```\nGood luck", BODY);
        assert_eq!(extract_json(&content), BODY.trim());
    }

    #[test]
    fn test_extract_generic_fence_requires_object() {
        assert_eq!(extract_json("```\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(extract_json("  ```\nnot json\n```  "), "```\nnot json\n```");
    }

    #[test]
    fn test_extract_plain_content() {
        assert_eq!(extract_json("\n  {\"a\": 1}  \n"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_recommendation_fields() {
        let content = format!("```json\n{}\n```", BODY);
        let response = parse_advisor_response(&content, 4321).unwrap();

        assert_eq!(response.analysis, "Range-bound majors");
        assert_eq!(response.tokens_used, 4321);
        assert_eq!(response.raw_response, content);
        assert_eq!(response.risk_warnings, vec!["Funding elevated on SOL".to_string()]);

        let rec = &response.recommendations[0];
        assert_eq!(rec.action, "HOLD");
        assert_eq!(rec.confidence, 0.65);
        assert_eq!(rec.suggested_leverage.as_deref(), Some("10x"));
        assert_eq!(rec.suggested_size.as_deref(), Some("0.25"));
        assert_eq!(rec.suggested_entry, None);
        assert_eq!(rec.suggested_stop_loss, Some(95000.0));
        assert_eq!(rec.suggested_take_profit, Some(112000.5));
    }

    #[test]
    fn test_raw_fields_not_serialized() {
        let response = parse_advisor_response(BODY, 10).unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("raw_response").is_none());
        assert!(json.get("tokens_used").is_none());
        assert!(json["recommendations"][0].get("suggested_entry").is_none());
    }

    #[test]
    fn test_parse_failure_keeps_raw_content() {
        let err = parse_advisor_response("I cannot help with that.", 3).unwrap_err();
        match err {
            LlmError::Parse { raw, .. } => assert_eq!(raw, "I cannot help with that."),
            other => panic!("unexpected error: {}", other),
        }
    }
}
