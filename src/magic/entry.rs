use super::{message, Hit, Offset, Test};
use crate::data_type::DataType;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MagicEntry {
    pub line_num: usize,
    pub level: u32,
    pub offset: Offset,
    pub data_type: DataType,
    pub test: Test,
    pub message: String,
    pub mime: Option<String>,
}

impl MagicEntry {
    /// Tests the entry against `buf`. `here` is where the parent's match
    /// ended, for relative offsets.
    pub fn matches(&self, buf: &[u8], here: usize) -> Option<Hit> {
        let offset = self.offset.resolve(buf, here)?;
        let hit = self.test.perform(&self.data_type, buf, offset);

        debug!(
            line = self.line_num,
            level = self.level,
            offset,
            matched = hit.is_some(),
            "magic test"
        );

        hit
    }

    pub fn describe(&self, hit: &Hit) -> String {
        message::render(&self.message, &hit.value)
    }
}
