use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/gemini/generate`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOutlineRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub generation_config: Option<Value>,
    #[serde(default)]
    pub safety_settings: Option<Vec<Value>>,
    #[serde(default)]
    pub tools: Option<Vec<Value>>,
}

/// Body of `POST /api/gemini/generate-image`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub generation_config: Option<Value>,
    #[serde(default)]
    pub safety_settings: Option<Vec<Value>>,
}

/// Body of `POST /api/gemini/generate-lesson-content`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonContentRequest {
    #[serde(default)]
    pub lesson_id: Option<Value>,
    #[serde(default)]
    pub context: Option<LessonContext>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub generation_config: Option<Value>,
    #[serde(default)]
    pub safety_settings: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonContext {
    #[serde(default)]
    pub course_title: Option<String>,
    #[serde(default)]
    pub module_title: Option<String>,
    #[serde(default)]
    pub lesson_title: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub previous_lessons: Vec<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// Returns the trimmed value when it is present and not blank
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Lesson ids arrive as strings or numbers depending on the CMS collection
pub fn lesson_id_string(value: &Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_course_request_camel_case() {
        let req: CourseOutlineRequest = serde_json::from_value(json!({
            "model": "gemini-pro",
            "keywords": "Python",
            "generationConfig": {"temperature": 0.4},
            "safetySettings": [{"category": "HARM_CATEGORY_HARASSMENT", "threshold": "BLOCK_NONE"}]
        }))
        .unwrap();

        assert_eq!(req.model.as_deref(), Some("gemini-pro"));
        assert_eq!(req.generation_config.unwrap()["temperature"], 0.4);
        assert_eq!(req.safety_settings.unwrap()[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert!(req.tools.is_none());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(&Some("  Rust ".to_string())), Some("Rust"));
        assert_eq!(non_blank(&Some("   ".to_string())), None);
        assert_eq!(non_blank(&None), None);
    }

    #[test]
    fn test_lesson_id_string() {
        assert_eq!(lesson_id_string(&Some(json!("l-1"))), Some("l-1".to_string()));
        assert_eq!(lesson_id_string(&Some(json!(42))), Some("42".to_string()));
        assert_eq!(lesson_id_string(&Some(json!(""))), None);
        assert_eq!(lesson_id_string(&Some(json!(true))), None);
        assert_eq!(lesson_id_string(&None), None);
    }

    #[test]
    fn test_lesson_context_defaults() {
        let req: LessonContentRequest = serde_json::from_value(json!({
            "lessonId": 7,
            "context": {"lessonTitle": "Ownership"}
        }))
        .unwrap();
        let ctx = req.context.unwrap();
        assert_eq!(ctx.lesson_title.as_deref(), Some("Ownership"));
        assert!(ctx.previous_lessons.is_empty());
        assert!(ctx.course_title.is_none());
    }
}
