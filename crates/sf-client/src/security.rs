//! Security utilities for Salesforce API operations.
//!
//! ## Name validation
//!
//! Object and field names end up in request bodies and job definitions.
//! Validate anything user-provided with [`names`] before sending it:
//!
//! ```rust
//! use sf_writer_client::security::names;
//!
//! assert!(names::is_safe_name("Custom_Field__c"));
//! assert!(!names::is_safe_name("Bad'; DROP TABLE--"));
//! ```
//!
//! ## XML
//!
//! SOAP envelopes are built with `format!`, so every interpolated value MUST
//! go through [`xml::escape`]. Responses are small and flat enough to read
//! with the string helpers in [`xml`].

/// Validation for Salesforce API names (objects and fields).
pub mod names {
    /// Check that a name is a plausible Salesforce API name.
    ///
    /// API names start with a letter and contain only ASCII letters, digits
    /// and underscores (`Account`, `External_Id__c`, `ns__Thing__c`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use sf_writer_client::security::names;
    ///
    /// assert!(names::is_safe_name("Account"));
    /// assert!(!names::is_safe_name("1Account"));
    /// assert!(!names::is_safe_name(""));
    /// ```
    #[must_use]
    pub fn is_safe_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    }

    /// Check that a string looks like a 15 or 18 character Salesforce id.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sf_writer_client::security::names;
    ///
    /// assert!(names::is_valid_salesforce_id("01Q000000000001"));
    /// assert!(names::is_valid_salesforce_id("01Q000000000001AAA"));
    /// assert!(!names::is_valid_salesforce_id("01Q/../../etc"));
    /// ```
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// XML escaping and extraction for SOAP and async API payloads.
pub mod xml {
    /// A SOAP fault returned instead of a regular response body.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SoapFault {
        pub fault_code: String,
        pub fault_string: String,
    }

    impl std::fmt::Display for SoapFault {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "SOAP Fault: {} - {}", self.fault_code, self.fault_string)
        }
    }

    impl std::error::Error for SoapFault {}

    /// Escape a string for safe inclusion in XML content.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sf_writer_client::security::xml;
    ///
    /// let safe = xml::escape("Hello <World> & 'Friends'");
    /// assert_eq!(safe, "Hello &lt;World&gt; &amp; &apos;Friends&apos;");
    /// ```
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&apos;"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Reverse [`escape`] for the five predefined entities.
    #[must_use]
    pub fn unescape(value: &str) -> String {
        value
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }

    /// Find the first `<tag>` (optionally namespace-prefixed or carrying
    /// attributes) and return its unescaped text content.
    pub fn extract_element(xml: &str, tag: &str) -> Option<String> {
        let mut search_from = xml;
        while let Some(content) = next_element(search_from, tag) {
            match content {
                Ok(text) => return Some(text),
                Err(rest) => search_from = rest,
            }
        }
        None
    }

    /// Parse a SOAP fault from a response body, if there is one.
    pub fn parse_soap_fault(xml: &str) -> Option<SoapFault> {
        if !xml.contains("faultcode") {
            return None;
        }

        let fault_code = extract_element(xml, "faultcode")?;
        let fault_string =
            extract_element(xml, "faultstring").unwrap_or_else(|| "Unknown error".to_string());

        Some(SoapFault {
            fault_code,
            fault_string,
        })
    }

    /// Locate the next element named `tag`. Returns its content, or the
    /// input following it when the element is empty.
    fn next_element<'a>(xml: &'a str, tag: &str) -> Option<Result<String, &'a str>> {
        let mut offset = 0;
        loop {
            let open = offset + xml[offset..].find('<')?;
            let after = &xml[open + 1..];
            let name_len = after
                .find(|c: char| c == '>' || c == '/' || c.is_whitespace())
                .unwrap_or(after.len());
            let name = &after[..name_len];
            let local = name.rsplit(':').next().unwrap_or(name);

            if local != tag || name.starts_with('/') {
                offset = open + 1;
                continue;
            }

            let tag_end = open + 1 + after.find('>')?;
            if xml[..tag_end].ends_with('/') {
                // self-closing, no content
                return Some(Err(&xml[tag_end + 1..]));
            }

            let body = &xml[tag_end + 1..];
            let close = format!("</{}>", name);
            let end = body.find(&close)?;
            return Some(Ok(unescape(&body[..end])));
        }
    }
}

#[cfg(test)]
mod tests {
    mod name_tests {
        use super::super::names::*;

        #[test]
        fn test_is_safe_name() {
            assert!(is_safe_name("Account"));
            assert!(is_safe_name("External_Id__c"));
            assert!(is_safe_name("ns__Custom__c"));
            assert!(!is_safe_name(""));
            assert!(!is_safe_name("_Leading"));
            assert!(!is_safe_name("Has Space"));
            assert!(!is_safe_name("Bad'; DROP--"));
            assert!(!is_safe_name("Dotted.Name"));
        }

        #[test]
        fn test_is_valid_salesforce_id() {
            assert!(is_valid_salesforce_id("01Q5e000000XyZ1"));
            assert!(is_valid_salesforce_id("01Q5e000000XyZ1AAA"));
            assert!(!is_valid_salesforce_id("short"));
            assert!(!is_valid_salesforce_id("01Q5e000000XyZ!"));
        }
    }

    mod xml_tests {
        use super::super::xml::*;

        #[test]
        fn test_escape() {
            assert_eq!(escape("hello"), "hello");
            assert_eq!(escape("<tag>"), "&lt;tag&gt;");
            assert_eq!(escape("&amp;"), "&amp;amp;");
            assert_eq!(escape("\"quoted\""), "&quot;quoted&quot;");
            assert_eq!(escape("it's"), "it&apos;s");
        }

        #[test]
        fn test_unescape_reverses_escape() {
            let raw = "p@ss<w>rd & 'more' \"stuff\"";
            assert_eq!(unescape(&escape(raw)), raw);
            assert_eq!(unescape("&amp;lt;"), "&lt;");
        }

        #[test]
        fn test_extract_element_plain_prefixed_and_attributed() {
            assert_eq!(
                extract_element("<a><id>750x</id></a>", "id"),
                Some("750x".to_string())
            );
            assert_eq!(
                extract_element("<sf:faultcode>sf:INVALID_LOGIN</sf:faultcode>", "faultcode"),
                Some("sf:INVALID_LOGIN".to_string())
            );
            assert_eq!(
                extract_element(r#"<state xsi:type="xsd:string">Completed</state>"#, "state"),
                Some("Completed".to_string())
            );
            assert_eq!(extract_element("<a><b>1</b></a>", "missing"), None);
        }

        #[test]
        fn test_extract_element_skips_similar_names() {
            let xml = "<stateMessage>busy</stateMessage><state>InProgress</state>";
            assert_eq!(extract_element(xml, "state"), Some("InProgress".to_string()));
            assert_eq!(
                extract_element(xml, "stateMessage"),
                Some("busy".to_string())
            );
        }

        #[test]
        fn test_extract_element_self_closing_is_skipped() {
            let xml = "<batch><stateMessage/></batch><x><stateMessage>late</stateMessage></x>";
            assert_eq!(
                extract_element(xml, "stateMessage"),
                Some("late".to_string())
            );
            assert_eq!(extract_element("<stateMessage/>", "stateMessage"), None);
        }

        #[test]
        fn test_extract_element_unescapes() {
            assert_eq!(
                extract_element("<m>a &amp; b &lt;c&gt;</m>", "m"),
                Some("a & b <c>".to_string())
            );
        }

        #[test]
        fn test_parse_soap_fault() {
            let xml = r#"<soapenv:Envelope><soapenv:Body><soapenv:Fault>
                <faultcode>sf:INVALID_LOGIN</faultcode>
                <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>
                </soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
            let fault = parse_soap_fault(xml).unwrap();
            assert_eq!(fault.fault_code, "sf:INVALID_LOGIN");
            assert!(fault.fault_string.starts_with("INVALID_LOGIN"));
            assert!(fault.to_string().contains("SOAP Fault"));

            assert!(parse_soap_fault("<ok/>").is_none());
        }
    }
}
