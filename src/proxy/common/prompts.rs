// Prompt templates injected in front of caller input

use crate::models::LessonContext;

const KEYWORDS_SLOT: &str = "{keywords}";
const LANGUAGE_SLOT: &str = "{language}";

pub const COURSE_OUTLINE_TEMPLATE: &str = r#"You are an experienced curriculum developer specializing in creating comprehensive and engaging online courses. Your task is to design a course outline, focusing on providing a structured learning path for students.

Create a course outline. The outline should be in JSON format and include the following elements:

1. **Course Title:** A creative and engaging title for the entire course on {keywords}.
2. **Module Titles:** Seven distinctive and descriptive titles for the course modules. Each module should cover a specific area of {keywords}.
3. **Lesson Titles:** For each module, create a list of lesson titles. The total number of lesson titles for all modules should be between 25 and 40. Each lesson title should be concise and clearly indicate the topic covered in that lesson.

**Important:** Provide only the titles. Do not include descriptions or additional content.

The JSON output must follow this structure:
```json
{
  "course_title": "[Course Title]",
  "modules": [
    {
      "module_title": "[Module 1 Title]",
      "lessons": [
        "[Lesson 1 Title]",
        "[Lesson 2 Title]"
      ]
    },
    {
      "module_title": "[Module 2 Title]",
      "lessons": [
        "[Lesson 1 Title]",
        "[Lesson 2 Title]"
      ]
    }
  ]
}
```
Ensure that the total number of lesson titles across all seven modules is between 25 and 40.
The content must be in {language}."#;

/// Fill every `{keywords}` slot of the outline template
pub fn course_outline_prompt(keywords: &str, language: &str) -> String {
    COURSE_OUTLINE_TEMPLATE
        .replace(LANGUAGE_SLOT, language)
        .replace(KEYWORDS_SLOT, keywords)
}

/// Instructional prompt for a single lesson, built from whatever context the caller sent
pub fn lesson_content_prompt(lesson_id: &str, ctx: &LessonContext, default_language: &str) -> String {
    let field = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    let lesson_title = field(&ctx.lesson_title).unwrap_or_else(|| lesson_id.to_string());
    let language = field(&ctx.language).unwrap_or_else(|| default_language.to_string());

    let mut prompt = String::from(
        "You are an expert instructor writing the full content of one lesson of an online course.\n\n",
    );

    if let Some(course) = field(&ctx.course_title) {
        prompt.push_str(&format!("Course: {}\n", course));
    }
    if let Some(module) = field(&ctx.module_title) {
        prompt.push_str(&format!("Module: {}\n", module));
    }
    prompt.push_str(&format!("Lesson: {}\n", lesson_title));
    if let Some(keywords) = field(&ctx.keywords) {
        prompt.push_str(&format!("Key topics: {}\n", keywords));
    }
    if let Some(audience) = field(&ctx.audience) {
        prompt.push_str(&format!("Audience: {}\n", audience));
    }

    let previous: Vec<&str> = ctx
        .previous_lessons
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !previous.is_empty() {
        prompt.push_str("\nLessons already covered (do not repeat them):\n");
        for title in previous {
            prompt.push_str(&format!("- {}\n", title));
        }
    }

    prompt.push_str(&format!(
        "\nWrite the lesson in Markdown. Start with a level-one heading with the lesson title, \
         explain the concepts step by step with examples, and finish with a short summary and \
         three review questions. Return only the Markdown content.\nThe content must be in {}.",
        language
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_prompt_replaces_every_slot() {
        let prompt = course_outline_prompt("Python", "Spanish");
        assert!(!prompt.contains(KEYWORDS_SLOT));
        assert!(!prompt.contains(LANGUAGE_SLOT));
        assert_eq!(prompt.matches("Python").count(), 2);
        assert!(prompt.ends_with("The content must be in Spanish."));
        assert!(prompt.contains("```json"));
    }

    #[test]
    fn test_keywords_containing_slot_text_are_not_reexpanded() {
        let prompt = course_outline_prompt("{language}", "English");
        assert!(prompt.contains("course on {language}."));
    }

    #[test]
    fn test_lesson_prompt_uses_context() {
        let ctx = LessonContext {
            course_title: Some("Rust from zero".into()),
            module_title: Some("Memory".into()),
            lesson_title: Some("Ownership".into()),
            previous_lessons: vec!["Variables".into(), "  ".into()],
            ..LessonContext::default()
        };
        let prompt = lesson_content_prompt("l-1", &ctx, "Spanish");

        assert!(prompt.contains("Course: Rust from zero"));
        assert!(prompt.contains("Module: Memory"));
        assert!(prompt.contains("Lesson: Ownership"));
        assert!(prompt.contains("- Variables\n"));
        assert!(!prompt.contains("Audience:"));
        assert!(prompt.ends_with("The content must be in Spanish."));
    }

    #[test]
    fn test_lesson_prompt_language_override() {
        let ctx = LessonContext {
            lesson_title: Some("Closures".into()),
            language: Some("English".into()),
            ..LessonContext::default()
        };
        let prompt = lesson_content_prompt("l-2", &ctx, "Spanish");
        assert!(prompt.ends_with("The content must be in English."));
    }
}
