use csv::{QuoteStyle, Terminator, WriterBuilder};
use encoding_rs::EncoderResult;
use std::fs::File;
use std::path::{Path, PathBuf};

pub use encoding_rs::{Encoding, GBK, UTF_8};

use crate::boss::types::ListingRecord;
use crate::Result;

/// Column names, in the order `ListingRecord::columns` yields values.
pub const HEADER: [&str; 10] = [
    "职位", "工资", "地址", "工作经验", "学历", "公司名", "分类", "金融", "员工数", "详情",
];

/// Comma separated output file, owned for the duration of one crawl.
///
/// Fields are never quoted, commas were already replaced during extraction. Rows are
/// flushed per batch, dropping the writer flushes whatever is left and closes the file,
/// so an interrupted crawl leaves a readable prefix behind.
pub struct RecordWriter {
    out: csv::Writer<File>,
    encoding: &'static Encoding,
    path: PathBuf,
    records: usize,
}

impl RecordWriter {
    /// Create (or truncate) `path` and write the header row.
    pub fn create(path: impl AsRef<Path>, encoding: &'static Encoding) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        let out = WriterBuilder::new()
            .quote_style(QuoteStyle::Never)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);
        let mut writer = Self {
            out,
            encoding,
            path,
            records: 0,
        };
        writer.write_row(&HEADER)?;
        writer.out.flush()?;
        log::debug!(
            "created {} with {} encoding",
            writer.path.display(),
            writer.encoding.name()
        );
        Ok(writer)
    }

    pub fn write_record(&mut self, record: &ListingRecord) -> Result<()> {
        self.write_row(&record.columns())?;
        self.records += 1;
        Ok(())
    }

    /// Append a page worth of records and flush them to disk.
    pub fn write_batch(&mut self, records: &[ListingRecord]) -> Result<()> {
        for record in records {
            self.write_record(record)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Number of data rows written so far, header excluded.
    pub fn records(&self) -> usize {
        self.records
    }

    /// Flush and close the file, surfacing any error the implicit drop would swallow.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.out.flush()?;
        Ok(std::mem::take(&mut self.path))
    }

    fn write_row(&mut self, fields: &[&str]) -> Result<()> {
        let encoded = fields
            .iter()
            .map(|field| encode_lossy(self.encoding, field))
            .collect::<Vec<_>>();
        self.out.write_record(&encoded)?;
        Ok(())
    }
}

/// Encode `text`, dropping characters the target encoding cannot represent.
fn encode_lossy(encoding: &'static Encoding, text: &str) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 1024];
    let mut src = text;
    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(src, &mut buf, true);
        out.extend_from_slice(&buf[..written]);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(c) => {
                log::debug!("dropping {:?}, not representable in {}", c, encoding.name());
            }
        }
    }
    out
}
