//! Question and answer types

use crate::error::{InstallError, Result};

/// What kind of answer a question accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    /// Anything goes
    FreeText,
    /// Only a member of the ordered allowed set (or the default on empty input)
    BoundedChoice(Vec<String>),
}

/// A single question put to the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    prompt: String,
    kind: QuestionKind,
    default: Option<String>,
}

impl Question {
    /// Free text question without a default
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::FreeText,
            default: None,
        }
    }

    /// Free text question whose empty answer resolves to `default`
    ///
    /// An empty default is treated as no default at all.
    pub fn text_with_default(prompt: impl Into<String>, default: impl Into<String>) -> Self {
        let default = default.into();
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::FreeText,
            default: (!default.is_empty()).then_some(default),
        }
    }

    /// Constrained choice; the default must be one of `allowed`
    pub fn choice<I, S>(prompt: impl Into<String>, allowed: I, default: Option<&str>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prompt = prompt.into();
        let mut values: Vec<String> = Vec::new();
        for value in allowed {
            let value = value.into();
            if !values.contains(&value) {
                values.push(value);
            }
        }

        if values.is_empty() {
            return Err(InstallError::InvalidQuestion {
                prompt,
                reason: "a bounded choice needs at least one allowed value".to_string(),
            });
        }

        if let Some(default) = default {
            if !values.iter().any(|v| v == default) {
                return Err(InstallError::InvalidQuestion {
                    prompt,
                    reason: format!(
                        "default `{}` is not one of [{}]",
                        default,
                        values.join("/")
                    ),
                });
            }
        }

        Ok(Self {
            prompt,
            kind: QuestionKind::BoundedChoice(values),
            default: default.map(str::to_string),
        })
    }

    /// Yes/no question over `{"y", "n"}`
    pub fn yes_no(prompt: impl Into<String>, default: bool) -> Self {
        Self {
            prompt: prompt.into(),
            kind: QuestionKind::BoundedChoice(vec!["y".to_string(), "n".to_string()]),
            default: Some(if default { "y" } else { "n" }.to_string()),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    pub fn default(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Allowed values for a bounded choice, empty for free text
    pub fn allowed_values(&self) -> &[String] {
        match &self.kind {
            QuestionKind::BoundedChoice(values) => values,
            QuestionKind::FreeText => &[],
        }
    }

    /// Resolve one raw line of input, `None` meaning "ask again"
    pub(crate) fn resolve(&self, input: &str) -> Option<Answer> {
        match (&self.kind, self.default.as_deref()) {
            (_, Some(default)) if input.is_empty() => Some(Answer::new(default)),
            (QuestionKind::FreeText, _) => Some(Answer::new(input)),
            (QuestionKind::BoundedChoice(values), _) => values
                .iter()
                .any(|v| v == input)
                .then(|| Answer::new(input)),
        }
    }

    /// Line shown to the operator
    pub(crate) fn render(&self) -> String {
        let mut line = format!(" * {}", self.prompt);
        match (&self.kind, self.default.as_deref()) {
            (QuestionKind::BoundedChoice(values), Some(default)) => {
                line.push_str(&format!(" [{}] (default: {})", values.join("/"), default));
            }
            (QuestionKind::BoundedChoice(values), None) => {
                line.push_str(&format!(" [{}]", values.join("/")));
            }
            (QuestionKind::FreeText, Some(default)) => {
                line.push_str(&format!(" [{}]", default));
            }
            (QuestionKind::FreeText, None) => {}
        }
        line.push_str(" : ");
        line
    }
}

/// The resolved answer to a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer(String);

impl Answer {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True for the `y` member of a yes/no question
    pub fn is_yes(&self) -> bool {
        self.0 == "y"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_rejects_default_outside_allowed_set() {
        let err = Question::choice("Pick", ["a", "b"], Some("c")).unwrap_err();
        assert!(err.to_string().contains("`c`"));
    }

    #[test]
    fn test_choice_rejects_empty_allowed_set() {
        let empty: [&str; 0] = [];
        assert!(Question::choice("Pick", empty, None).is_err());
    }

    #[test]
    fn test_choice_deduplicates_allowed_values() {
        let q = Question::choice("Pick", ["a", "b", "a"], Some("b")).unwrap();
        assert_eq!(q.allowed_values(), ["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_empty_text_default_means_no_default() {
        let q = Question::text_with_default("Credentials", "");
        assert_eq!(q.default(), None);
        assert_eq!(q.resolve(""), Some(Answer::new("")));
    }

    #[test]
    fn test_render_shows_choices_and_default() {
        let q = Question::yes_no("Install binary ?", true);
        assert_eq!(q.render(), " * Install binary ? [y/n] (default: y) : ");

        let q = Question::text_with_default("Where ?", "/usr/bin");
        assert_eq!(q.render(), " * Where ? [/usr/bin] : ");

        let q = Question::text("Name");
        assert_eq!(q.render(), " * Name : ");
    }

    #[test]
    fn test_bounded_choice_without_default_rejects_empty() {
        let q = Question::choice("Mode", ["manual", "auto"], None).unwrap();
        assert_eq!(q.resolve(""), None);
        assert_eq!(q.resolve("auto"), Some(Answer::new("auto")));
    }
}
