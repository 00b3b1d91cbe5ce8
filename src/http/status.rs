use std::collections::BTreeMap;

const FALLBACK_CODE: u16 = 500;
const FALLBACK_MESSAGE: &str = "Internal Server Error";

/// Status code to reason phrase table, loaded from `statuses.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusTable {
    messages: BTreeMap<u16, String>,
}

impl StatusTable {
    pub fn new(messages: BTreeMap<u16, String>) -> Self {
        Self { messages }
    }

    /// Reason phrase for `code`; unknown codes get the 500 phrase.
    ///
    /// ```
    /// # use rawhttp::http::status::StatusTable;
    /// let table = StatusTable::new([(200, "OK".to_string())].into());
    /// assert_eq!(table.message(200), "OK");
    /// assert_eq!(table.message(299), "Internal Server Error");
    /// ```
    pub fn message(&self, code: u16) -> &str {
        self.messages
            .get(&code)
            .or_else(|| self.messages.get(&FALLBACK_CODE))
            .map(String::as_str)
            .unwrap_or(FALLBACK_MESSAGE)
    }

    pub fn contains(&self, code: u16) -> bool {
        self.messages.contains_key(&code)
    }

    /// All known codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &str)> {
        self.messages.iter().map(|(code, msg)| (*code, msg.as_str()))
    }
}
