//! Regex row filtering over buffered line sources.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use regex::{Regex, RegexBuilder};

use crate::{ConvertError, Result};

/// Case-insensitive line filter.
///
/// A line is kept when the pattern matches anywhere in it. Header rows are
/// not special-cased: whatever the first line of the source is, it passes
/// through the same match.
#[derive(Debug)]
pub struct RowFilter {
    pattern: Regex,
}

impl RowFilter {
    /// Compile the pattern; compile failure is a filter error.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| ConvertError::filter(format!("invalid pattern `{pattern}`: {e}")))?;
        Ok(RowFilter { pattern })
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.pattern.is_match(line)
    }

    /// Lazy, single-pass sequence of matching lines in original order.
    ///
    /// Each call consumes a fresh reader; re-filtering means re-opening the
    /// source.
    pub fn matching_lines<R: BufRead>(&self, source: R) -> MatchingLines<'_, R> {
        MatchingLines {
            filter: self,
            lines: source.lines(),
        }
    }

    /// Stream matching lines of the file at `source` into a new file at
    /// `sink`, one write per match, and return the match count. Both files
    /// are released on every exit path.
    pub fn filter_file(&self, source: &Path, sink: &Path) -> Result<u64> {
        let reader = BufReader::new(File::open(source).map_err(|e| {
            ConvertError::filter(format!("cannot open {}: {e}", source.display()))
        })?);
        let mut writer = BufWriter::new(File::create(sink).map_err(|e| {
            ConvertError::filter(format!("cannot create {}: {e}", sink.display()))
        })?);
        let mut matched = 0u64;
        for line in self.matching_lines(reader) {
            let line = line
                .map_err(|e| ConvertError::filter(format!("read of {} failed: {e}", source.display())))?;
            writeln!(writer, "{line}").map_err(|e| {
                ConvertError::filter(format!("write to {} failed: {e}", sink.display()))
            })?;
            matched += 1;
        }
        writer
            .flush()
            .map_err(|e| ConvertError::filter(format!("write to {} failed: {e}", sink.display())))?;
        Ok(matched)
    }
}

/// Iterator over the matching lines of one reader
pub struct MatchingLines<'a, R: BufRead> {
    filter: &'a RowFilter,
    lines: std::io::Lines<R>,
}

impl<R: BufRead> Iterator for MatchingLines<'_, R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.lines.next()? {
                Ok(line) if self.filter.is_match(&line) => return Some(Ok(line)),
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
