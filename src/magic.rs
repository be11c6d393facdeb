use crate::error::{MagicError, MagicResult};
use std::iter::Peekable;

pub use self::entry::*;
pub use self::offset::*;
pub use self::test::*;

mod entry;
pub mod message;
mod offset;
mod test;

/// A loaded magic database: top-level rules in file order, each with its
/// continuation lines (`>`, `>>`, ...) nested underneath.
#[derive(Clone, Debug, Default)]
pub struct MagicSet {
    lists: Vec<MagicList>,
}

#[derive(Clone, Debug)]
struct MagicList {
    root: MagicEntry,
    children: Vec<MagicList>,
}

/// The description assembled from the messages of every entry that matched
/// along one top-level rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Description {
    pub text: String,
    pub mime: Option<String>,
}

impl MagicSet {
    pub fn new() -> MagicSet {
        MagicSet { lists: Vec::new() }
    }

    pub fn from_entries(entries: Vec<MagicEntry>) -> MagicResult<MagicSet> {
        let mut set = MagicSet::new();
        set.add_entries(entries)?;
        Ok(set)
    }

    pub fn add_entries(&mut self, entries: Vec<MagicEntry>) -> MagicResult<()> {
        let mut entry_iter = entries.into_iter().peekable();

        while let Some(entry) = entry_iter.next() {
            if entry.level > 0 {
                return Err(MagicError::Structure(format!(
                    "line {}: continuation entry without a level 0 parent",
                    entry.line_num
                )));
            }

            let mut list = MagicList {
                root: entry,
                children: Vec::new(),
            };
            list.add_entries(&mut entry_iter)?;
            self.lists.push(list);
        }

        Ok(())
    }

    pub fn extend(&mut self, other: MagicSet) {
        self.lists.extend(other.lists);
    }

    /// Number of top-level rules.
    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Every entry in file order, levels intact; the inverse of
    /// [`MagicSet::from_entries`].
    pub fn entries(&self) -> Vec<MagicEntry> {
        let mut out = Vec::new();
        for list in self.lists.iter() {
            list.flatten_into(&mut out);
        }
        out
    }

    /// Descriptions of the top-level rules that match `buf`, in rule order.
    /// Stops after the first unless `keep_going` is set.
    pub fn matches(&self, buf: &[u8], keep_going: bool) -> Vec<Description> {
        let mut found = Vec::new();

        for list in self.lists.iter() {
            let mut desc = Description::default();
            if list.matches(buf, 0, &mut desc) && !desc.text.is_empty() {
                found.push(desc);
                if !keep_going {
                    break;
                }
            }
        }

        found
    }
}

impl MagicList {
    fn add_entries<I: Iterator<Item = MagicEntry>>(
        &mut self,
        entries: &mut Peekable<I>,
    ) -> MagicResult<()> {
        while let Some(level) = entries.peek().map(|e| e.level) {
            if level <= self.root.level {
                return Ok(());
            } else if level == self.root.level + 1 {
                if let Some(root) = entries.next() {
                    let mut list = MagicList {
                        root,
                        children: Vec::new(),
                    };
                    list.add_entries(entries)?;
                    self.children.push(list);
                }
            } else {
                let line_num = entries.peek().map_or(0, |e| e.line_num);
                return Err(MagicError::Structure(format!(
                    "line {}: level too deep for magic entry ({} > {} + 1)",
                    line_num, level, self.root.level
                )));
            }
        }

        Ok(())
    }

    fn flatten_into(&self, out: &mut Vec<MagicEntry>) {
        out.push(self.root.clone());
        for child in self.children.iter() {
            child.flatten_into(out);
        }
    }

    fn matches(&self, buf: &[u8], here: usize, desc: &mut Description) -> bool {
        let hit = match self.root.matches(buf, here) {
            Some(hit) => hit,
            None => return false,
        };

        desc.push(&self.root.describe(&hit));
        if desc.mime.is_none() {
            desc.mime = self.root.mime.clone();
        }

        for child in self.children.iter() {
            child.matches(buf, hit.end, desc);
        }

        true
    }
}

impl Description {
    /// Appends one entry's message. A leading `\b` glues it to the previous
    /// text; otherwise the two are separated by a space.
    pub fn push(&mut self, message: &str) {
        let (glued, message) = match message.strip_prefix("\\b") {
            Some(rest) => (true, rest),
            None => (false, message),
        };
        if message.is_empty() {
            return;
        }
        if !glued && !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(message);
    }
}
