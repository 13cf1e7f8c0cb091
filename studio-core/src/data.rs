/// An LDIF content record: a DN with a list of attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub dn: String,
    pub attributes: Vec<Attribute>,
}

/// An attribute: a descriptor (name) with a list of binary-safe values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub ad: String,
    pub values: Vec<Vec<u8>>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Entry {
        Entry {
            dn: dn.into(),
            attributes: Vec::new(),
        }
    }

    /// Find an attribute by descriptor name, ignoring case.
    /// If `create` is true and the attribute doesn't exist, create it.
    pub fn find_attribute(&mut self, ad: &str, create: bool) -> Option<&mut Attribute> {
        let pos = self
            .attributes
            .iter()
            .position(|a| a.ad.eq_ignore_ascii_case(ad));
        match pos {
            Some(i) => Some(&mut self.attributes[i]),
            None if create => {
                self.attributes.push(Attribute::new(ad));
                self.attributes.last_mut()
            }
            None => None,
        }
    }

    /// Find an attribute by descriptor name, ignoring case.
    pub fn get_attribute(&self, ad: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.ad.eq_ignore_ascii_case(ad))
    }

    /// Append one value, creating the attribute on first use.
    pub fn add_value(&mut self, ad: &str, value: &[u8]) {
        if let Some(attr) = self.find_attribute(ad, true) {
            attr.append_value(value);
        }
    }

    /// All values of `ad` decoded as (lossy) UTF-8.
    pub fn string_values(&self, ad: &str) -> Vec<String> {
        self.get_attribute(ad)
            .map(|a| a.values.iter().map(|v| value_to_string(v)).collect())
            .unwrap_or_default()
    }

    /// The first value of `ad` as a string.
    pub fn first_string(&self, ad: &str) -> Option<String> {
        self.get_attribute(ad)
            .and_then(|a| a.values.first())
            .map(|v| value_to_string(v))
    }
}

impl Attribute {
    pub fn new(ad: impl Into<String>) -> Attribute {
        Attribute {
            ad: ad.into(),
            values: Vec::new(),
        }
    }

    pub fn append_value(&mut self, data: &[u8]) {
        self.values.push(data.to_vec());
    }
}

/// Convert a binary value to a String.
pub fn value_to_string(value: &[u8]) -> String {
    String::from_utf8_lossy(value).into_owned()
}
