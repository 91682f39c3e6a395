//! Export settings
//!
//! Settings can be persisted two ways: through `serde` (JSON, TOML, ...) or as
//! a compact binary record. The binary record starts with a `major.minor`
//! version; readers accept any minor revision of their own major version and
//! ignore trailing bytes a newer minor revision may append.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How the finished buffer is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMode {
    /// The buffer is written verbatim
    #[default]
    Raw,
    /// The buffer is zlib-compressed before writing
    Compressed,
}

impl CompressionMode {
    fn to_i32(self) -> i32 {
        match self {
            CompressionMode::Raw => 0,
            CompressionMode::Compressed => 1,
        }
    }

    fn from_i32(value: i32) -> Result<Self> {
        match value {
            0 => Ok(CompressionMode::Raw),
            1 => Ok(CompressionMode::Compressed),
            other => Err(Error::InvalidSettings(format!(
                "unknown compression mode {}",
                other
            ))),
        }
    }
}

/// Options recognized by the exporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Output write mode
    pub compression: CompressionMode,
}

impl ExportSettings {
    /// Major version of the binary record
    pub const VERSION_MAJOR: u16 = 1;
    /// Minor version of the binary record
    pub const VERSION_MINOR: u16 = 0;

    /// Settings with the given compression mode
    pub fn new(compression: CompressionMode) -> Self {
        Self { compression }
    }

    /// Write the versioned binary record
    pub fn write_record<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&Self::VERSION_MAJOR.to_le_bytes())?;
        writer.write_all(&Self::VERSION_MINOR.to_le_bytes())?;
        writer.write_all(&self.compression.to_i32().to_le_bytes())?;
        Ok(())
    }

    /// Read a versioned binary record
    pub fn read_record<R: Read>(mut reader: R) -> Result<Self> {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header)?;
        let major = u16::from_le_bytes([header[0], header[1]]);
        if major != Self::VERSION_MAJOR {
            return Err(Error::InvalidSettings(format!(
                "record version {} is not compatible with version {}",
                major,
                Self::VERSION_MAJOR
            )));
        }

        let mut mode = [0u8; 4];
        reader.read_exact(&mut mode)?;
        let compression = CompressionMode::from_i32(i32::from_le_bytes(mode))?;
        Ok(Self { compression })
    }
}
