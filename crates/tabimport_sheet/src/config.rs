//! Document options.

/// Options for opening a tabular document.
#[derive(Debug, Clone)]
pub struct SheetOptions {
    /// Field delimiter.
    pub delimiter: u8,

    /// Never write back, even if the file is writable.
    pub read_only: bool,

    /// Token written for a `true` yes/no flag.
    pub yes_token: String,

    /// Token written for a `false` yes/no flag.
    pub no_token: String,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            read_only: false,
            yes_token: "Y".into(),
            no_token: "N".into(),
        }
    }
}

impl SheetOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the field delimiter.
    #[must_use]
    pub const fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sets whether the document is opened read-only.
    #[must_use]
    pub const fn read_only(mut self, value: bool) -> Self {
        self.read_only = value;
        self
    }

    /// Sets the yes/no flag tokens.
    #[must_use]
    pub fn yes_no_tokens(mut self, yes: impl Into<String>, no: impl Into<String>) -> Self {
        self.yes_token = yes.into();
        self.no_token = no.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = SheetOptions::default();
        assert_eq!(options.delimiter, b',');
        assert!(!options.read_only);
        assert_eq!(options.yes_token, "Y");
        assert_eq!(options.no_token, "N");
    }

    #[test]
    fn builder_pattern() {
        let options = SheetOptions::new()
            .delimiter(b';')
            .read_only(true)
            .yes_no_tokens("S", "N");

        assert_eq!(options.delimiter, b';');
        assert!(options.read_only);
        assert_eq!(options.yes_token, "S");
    }
}
