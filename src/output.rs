//! CSV output
//!
//! One row per [`ResourceRecord`] under a `profile,region,type,name` header.
//! Quoting of values containing separators is left to the `csv` writer.

use crate::console::console_url;
use crate::resource::ResourceRecord;
use anyhow::{anyhow, Context, Result};
use csv::WriterBuilder;
use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::Path;

/// Column names of the output file
pub const HEADER: [&str; 4] = ["profile", "region", "type", "name"];

/// Destination for records
pub trait RecordSink {
    fn write_record(&mut self, record: &ResourceRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<ResourceRecord> {
    fn write_record(&mut self, record: &ResourceRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// CSV writer sink
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    console_urls: bool,
    rows: usize,
}

impl<W: Write> CsvSink<W> {
    /// Wrap a writer and emit the header row
    pub fn new(inner: W, console_urls: bool) -> Result<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);

        let header = if console_urls {
            writer.write_record(HEADER.iter().chain(["url"].iter()))
        } else {
            writer.write_record(HEADER)
        };
        header.context("write CSV header")?;

        Ok(Self {
            writer,
            console_urls,
            rows: 0,
        })
    }

    /// Data rows written so far
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow!("flush CSV output: {}", e.error()))
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn write_record(&mut self, record: &ResourceRecord) -> Result<()> {
        let result = if self.console_urls {
            let url = console_url(record).unwrap_or_default();
            self.writer.write_record([
                record.profile.as_str(),
                record.region.as_str(),
                record.type_id.as_str(),
                record.name.as_str(),
                url.as_str(),
            ])
        } else {
            self.writer.write_record([
                record.profile.as_str(),
                record.region.as_str(),
                record.type_id.as_str(),
                record.name.as_str(),
            ])
        };
        result.with_context(|| format!("write CSV row #{}", self.rows + 1))?;
        self.rows += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flush CSV output")
    }
}

/// Open the output destination; `-` is stdout
pub fn open_output(destination: &str, console_urls: bool) -> Result<CsvSink<Box<dyn Write>>> {
    let writer: Box<dyn Write> = if destination == "-" {
        Box::new(std::io::stdout())
    } else {
        let path = Path::new(destination);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
            }
        }
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        Box::new(file)
    };

    CsvSink::new(writer, console_urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ExecutionContext;

    fn record(name: &str) -> ResourceRecord {
        ResourceRecord::new(&ExecutionContext::new("dev", "eu-west-1"), "security-group", name.to_string())
    }

    #[test]
    fn test_header_only_when_empty() {
        let sink = CsvSink::new(Vec::new(), false).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(out, "profile,region,type,name\n");
    }

    #[test]
    fn test_values_with_separator_are_quoted() {
        let mut sink = CsvSink::new(Vec::new(), false).unwrap();
        sink.write_record(&record("sg-1,default")).unwrap();
        assert_eq!(sink.rows(), 1);
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        assert_eq!(
            out,
            "profile,region,type,name\ndev,eu-west-1,security-group,\"sg-1,default\"\n"
        );
    }

    #[test]
    fn test_console_url_column() {
        let mut sink = CsvSink::new(Vec::new(), true).unwrap();
        sink.write_record(&record("sg-1,default")).unwrap();
        let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("profile,region,type,name,url"));
        assert!(lines.next().unwrap().ends_with("#SecurityGroup:groupId=sg-1"));
    }

    #[test]
    fn test_open_output_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");
        let mut sink = open_output(path.to_str().unwrap(), false).unwrap();
        sink.write_record(&record("sg-2,web")).unwrap();
        sink.flush().unwrap();
        drop(sink);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("profile,region,type,name\n"));
        assert_eq!(content.lines().count(), 2);
    }
}
