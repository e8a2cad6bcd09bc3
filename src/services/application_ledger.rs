//! 申请记录服务 - 业务能力层
//!
//! 只负责"读写 jobs.csv"能力，不关心流程

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::PersistenceError;
use crate::models::ledger_entry::LEDGER_HEADER;
use crate::models::LedgerEntry;

/// 申请记录
///
/// 职责：
/// - 判断某个职位是否已经申请过
/// - 追加一条新的申请记录
/// - 只增不改：没有更新和删除操作
/// - 每次写入都重新打开文件，不跨职位持有文件句柄
pub struct ApplicationLedger {
    path: PathBuf,
}

impl ApplicationLedger {
    /// 使用记录文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 是否已有该职位的记录
    ///
    /// 文件不存在或无法读取时视为"没有"，不返回错误
    pub fn contains(&self, job_id: &str) -> bool {
        if !self.path.is_file() {
            return false;
        }

        match self.scan_for(job_id) {
            Ok(found) => found,
            Err(e) => {
                warn!("⚠️ 读取 {} 失败: {}", self.path.display(), e);
                false
            }
        }
    }

    fn scan_for(&self, job_id: &str) -> Result<bool, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let column = reader
            .byte_headers()?
            .iter()
            .position(|h| h.trim_ascii() == LEDGER_HEADER[0].as_bytes())
            .unwrap_or(0);

        // 按字节比较，单行编码损坏不影响其余记录
        for record in reader.byte_records() {
            let record = match record {
                Ok(record) => record,
                Err(e) if e.is_io_error() => return Err(e),
                Err(e) => {
                    warn!("⚠️ 跳过 {} 中无法解析的一行: {}", self.path.display(), e);
                    continue;
                }
            };
            if record.get(column).map(<[u8]>::trim_ascii) == Some(job_id.as_bytes()) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// 追加一条记录
    ///
    /// 文件不存在时先写表头。任何 I/O 失败都返回 `PersistenceError`，
    /// 调用方应终止整个运行。
    pub fn append(&self, entry: &LedgerEntry) -> Result<(), PersistenceError> {
        debug!("写入申请记录: {} -> {}", entry.job_id, self.path.display());

        let is_new = self
            .path
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let mut file = self.open_for_append()?;
        if !is_new {
            self.terminate_last_line(&mut file)
                .map_err(|source| PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(LEDGER_HEADER)
                .map_err(|source| self.csv_error(source))?;
        }
        writer
            .serialize(entry)
            .map_err(|source| self.csv_error(source))?;
        writer.flush().map_err(|source| PersistenceError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("📝 已记录到 {}: {}", self.path.display(), entry.job_id);
        Ok(())
    }

    /// 上一次写入若没有以换行结尾，先补一个换行
    fn terminate_last_line(&self, file: &mut File) -> std::io::Result<()> {
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))?;
        file.read_exact(&mut last)?;
        if last[0] != b'\n' {
            debug!("{} 末尾缺少换行，补齐后再追加", self.path.display());
            file.write_all(b"\n")?;
        }
        Ok(())
    }

    fn open_for_append(&self) -> Result<File, PersistenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| PersistenceError::Io {
                path: self.path.clone(),
                source,
            })
    }

    fn csv_error(&self, source: csv::Error) -> PersistenceError {
        PersistenceError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}
