// https://html.spec.whatwg.org/multipage/custom-elements.html#custom-element-definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomElementDefinition {
    pub name: String,
    pub local_name: String,
    pub observed_attributes: Vec<String>,
    // FIXME: Implement A form-associated boolean
    // FIXME: Implement A disable shadow boolean
}

impl CustomElementDefinition {
    pub fn new(name: &str, observed_attributes: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            local_name: name.to_string(),
            observed_attributes: observed_attributes
                .iter()
                .map(|attribute| attribute.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Whether a change to `attribute` enqueues an attributeChangedCallback reaction.
    pub fn observes(&self, attribute: &str) -> bool {
        self.observed_attributes
            .iter()
            .any(|observed| observed.eq_ignore_ascii_case(attribute))
    }
}

static RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

// https://html.spec.whatwg.org/multipage/custom-elements.html#valid-custom-element-name
pub fn is_valid_custom_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_with_lower_alpha = chars.next().is_some_and(|c| c.is_ascii_lowercase());

    starts_with_lower_alpha
        && name.contains('-')
        && !name.chars().any(|c| c.is_ascii_uppercase())
        && !RESERVED_NAMES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        assert!(is_valid_custom_element_name("lazy-html-include"));
        assert!(is_valid_custom_element_name("x-"));
        assert!(!is_valid_custom_element_name("div"));
        assert!(!is_valid_custom_element_name("Lazy-include"));
        assert!(!is_valid_custom_element_name("-lazy"));
        assert!(!is_valid_custom_element_name("font-face"));
    }

    #[test]
    fn observed_attributes() {
        let definition = CustomElementDefinition::new("x-include", &["source", "Request-Mode"]);
        assert!(definition.observes("source"));
        assert!(definition.observes("request-mode"));
        assert!(!definition.observes("scope-scripts"));
    }
}
