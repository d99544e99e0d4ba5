//! Configuration options for format conversion

/// Conversion configuration options
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    /// Indent JSON output with two spaces
    pub pretty_json: bool,
    /// Root element name for XML output
    pub xml_root: String,
    /// Element name for list entries in XML output and rows in XML input
    pub xml_item_tag: String,
    /// Spaces per indentation level for XML output (None = compact)
    pub xml_indent: Option<usize>,
    /// Table name used in SQL INSERT statements
    pub sql_table: String,
    /// Treat the first CSV line as the header
    pub csv_has_header: bool,
    /// Largest accepted input in bytes
    pub max_input_bytes: usize,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            pretty_json: true,
            xml_root: "data".to_string(),
            xml_item_tag: "item".to_string(),
            xml_indent: None,
            sql_table: "data".to_string(),
            csv_has_header: true,
            max_input_bytes: 100 * 1024 * 1024, // 100MB
        }
    }
}

impl ConversionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Compact output for machine consumption
    pub fn compact() -> Self {
        Self {
            pretty_json: false,
            xml_indent: None,
            ..Default::default()
        }
    }

    /// Indented output for people
    pub fn readable() -> Self {
        Self {
            pretty_json: true,
            xml_indent: Some(2),
            ..Default::default()
        }
    }

    pub fn with_pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }

    pub fn with_xml_root(mut self, root: impl Into<String>) -> Self {
        self.xml_root = root.into();
        self
    }

    pub fn with_xml_item_tag(mut self, tag: impl Into<String>) -> Self {
        self.xml_item_tag = tag.into();
        self
    }

    /// Set XML indentation (0-8 spaces, 0 = compact)
    pub fn with_xml_indent(mut self, width: usize) -> Result<Self, String> {
        if width > 8 {
            return Err("XML indent must be 0-8 spaces".to_string());
        }
        self.xml_indent = if width == 0 { None } else { Some(width) };
        Ok(self)
    }

    pub fn with_sql_table(mut self, table: impl Into<String>) -> Self {
        self.sql_table = table.into();
        self
    }

    pub fn with_csv_header(mut self, has_header: bool) -> Self {
        self.csv_has_header = has_header;
        self
    }

    pub fn with_max_input_bytes(mut self, limit: usize) -> Self {
        self.max_input_bytes = limit;
        self
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.xml_root.trim().is_empty() {
            return Err("XML root name must not be empty".to_string());
        }

        if self.xml_item_tag.trim().is_empty() {
            return Err("XML item tag must not be empty".to_string());
        }

        if self.xml_root.contains(char::is_whitespace)
            || self.xml_item_tag.contains(char::is_whitespace)
        {
            return Err("XML element names must not contain whitespace".to_string());
        }

        if self.sql_table.trim().is_empty() {
            return Err("SQL table name must not be empty".to_string());
        }

        if self.max_input_bytes < 1024 {
            return Err("Input limit must be at least 1KB".to_string());
        }

        if let Some(width) = self.xml_indent {
            if width > 8 {
                return Err("XML indent must be 0-8 spaces".to_string());
            }
        }

        Ok(())
    }
}

/// Parse a human size such as `100MB`, `512KB`, `1GB` or a plain byte count
pub fn parse_size(limit: &str) -> Result<usize, String> {
    let limit = limit.trim().to_uppercase();
    let (number, multiplier) = if let Some(n) = limit.strip_suffix("GB") {
        (n, 1024.0 * 1024.0 * 1024.0)
    } else if let Some(n) = limit.strip_suffix("MB") {
        (n, 1024.0 * 1024.0)
    } else if let Some(n) = limit.strip_suffix("KB") {
        (n, 1024.0)
    } else if let Some(n) = limit.strip_suffix('B') {
        (n, 1.0)
    } else {
        (limit.as_str(), 1.0)
    };

    let value = number
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid size '{}'. Use e.g. 100MB, 512KB or 1GB", limit))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("Invalid size '{}'", limit));
    }
    Ok((value * multiplier) as usize)
}
