//! Ordered, immutable list of detector class names.

/// Classes the receipt detector is trained on, in label-id order.
pub const RECEIPT_CLASSES: &[&str] = &[
    "company_name",
    "phone_number",
    "product",
    "quantity",
    "unit_price",
    "receipt_id",
];

/// Label names indexed by the integer class id found in label files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassList {
    names: Vec<String>,
}

impl ClassList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The six receipt fields.
    pub fn receipt() -> Self {
        Self::new(RECEIPT_CLASSES.iter().copied())
    }

    /// Name for `id`, or `None` when the id is out of range.
    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn contains_id(&self, id: usize) -> bool {
        id < self.names.len()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Inline YAML sequence body, e.g. `'company_name', 'phone_number'`.
    pub fn yaml_names(&self) -> String {
        self.names
            .iter()
            .map(|n| format!("'{}'", n.replace('\'', "''")))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for ClassList {
    fn default() -> Self {
        Self::receipt()
    }
}
