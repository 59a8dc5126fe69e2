//! Minimal placeholder substitution for prompt templates
//!
//! Templates reference values as `{{name}}`. Rendering walks the template
//! once; an unknown placeholder is a configuration error, never a retriable
//! one.

use corpora_common::errors::{AppError, Result};

/// Values available to prompt templates
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub source_lang: String,
    pub target_lang: String,
    pub country: String,
    pub source_text: String,
    pub tagged_text: String,
    pub chunk_to_translate: String,
    pub translation: String,
    pub reflection: String,
}

impl TemplateData {
    fn lookup(&self, name: &str) -> Option<&str> {
        match name {
            "source_lang" => Some(&self.source_lang),
            "target_lang" => Some(&self.target_lang),
            "country" => Some(&self.country),
            "source_text" => Some(&self.source_text),
            "tagged_text" => Some(&self.tagged_text),
            "chunk_to_translate" => Some(&self.chunk_to_translate),
            "translation" => Some(&self.translation),
            "reflection" => Some(&self.reflection),
            _ => None,
        }
    }
}

/// Substitute every `{{name}}` placeholder in the template
pub fn render(template: &str, data: &TemplateData) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let end = after.find("}}").ok_or_else(|| AppError::Fatal {
            message: format!("unterminated placeholder in template near: {:.40}", after),
        })?;

        let name = after[..end].trim();
        let value = data.lookup(name).ok_or_else(|| AppError::Fatal {
            message: format!("unknown template placeholder: {}", name),
        })?;

        out.push_str(value);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_placeholders() {
        let data = TemplateData {
            source_lang: "English".into(),
            target_lang: "French".into(),
            ..Default::default()
        };

        let out = render("from {{source_lang}} to {{target_lang}}", &data).unwrap();
        assert_eq!(out, "from English to French");
    }

    #[test]
    fn test_render_unknown_placeholder_is_fatal() {
        let err = render("hello {{nobody}}", &TemplateData::default()).unwrap_err();
        assert!(matches!(err, AppError::Fatal { .. }));
        assert!(!err.is_retriable());
    }

    #[test]
    fn test_render_unterminated_placeholder() {
        let err = render("hello {{source_lang", &TemplateData::default()).unwrap_err();
        assert!(matches!(err, AppError::Fatal { .. }));
    }

    #[test]
    fn test_render_leaves_plain_braces_alone() {
        // Substituted content may itself contain braces; they are not
        // reinterpreted.
        let data = TemplateData {
            source_text: "a {b} c".into(),
            ..Default::default()
        };
        let out = render("<T>{{source_text}}</T>", &data).unwrap();
        assert_eq!(out, "<T>a {b} c</T>");
    }
}
