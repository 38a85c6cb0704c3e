//! DOM Node - element storage

use crate::NodeId;

/// DOM node stored in the document arena
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// Children in document order
    pub children: Vec<NodeId>,
    /// Element data
    pub data: ElementData,
}

impl Node {
    /// Create a new detached element node
    pub fn element(tag: &str) -> Self {
        Self {
            parent: NodeId::NONE,
            children: Vec::new(),
            data: ElementData::new(tag),
        }
    }
}

/// Element-specific data
#[derive(Debug, Clone, Default)]
pub struct ElementData {
    /// Lowercased tag name
    pub tag: String,
    /// Attributes in insertion order
    pub attrs: Vec<(String, String)>,
    /// Text content
    pub text: String,
    /// Dirty form value; falls back to the `value` attribute when unset
    pub value: Option<String>,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Check attribute presence
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(k, _)| k == name)
    }

    /// Set attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name, value.to_string())),
        }
    }

    /// Remove attribute
    pub fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(k, _)| k != name);
        self.attrs.len() != before
    }

    /// Element `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// Current form value
    pub fn current_value(&self) -> &str {
        match &self.value {
            Some(v) => v,
            None => self.attr("value").unwrap_or(""),
        }
    }

    /// `type` of an input element, defaulting to text
    pub fn input_type(&self) -> &str {
        self.attr("type").unwrap_or("text")
    }

    /// `input type=range`
    pub fn is_range_input(&self) -> bool {
        self.tag == "input" && self.input_type().eq_ignore_ascii_case("range")
    }

    /// Whether this element is part of sequential focus navigation.
    ///
    /// An explicit tabindex decides on its own: non-negative values are
    /// focusable, negative ones never are.
    pub fn is_focusable(&self) -> bool {
        if let Some(Ok(index)) = self.attr("tabindex").map(|v| v.trim().parse::<i32>()) {
            return index >= 0;
        }

        match self.tag.as_str() {
            "a" => self.has_attr("href"),
            "input" => !self.has_attr("disabled") && self.input_type() != "hidden",
            "button" | "select" | "textarea" => !self.has_attr("disabled"),
            _ => false,
        }
    }
}
