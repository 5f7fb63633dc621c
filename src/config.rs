use anyhow::{anyhow, Result};
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub paths: PortalPaths,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self> {
        let paths = match env::var("SYNERGY_DATA_DIR") {
            Ok(base) if !base.trim().is_empty() => PortalPaths::from_base_dir(base)?,
            _ => PortalPaths::discover()?,
        };
        Ok(Self { paths })
    }

    pub fn new(paths: PortalPaths) -> Self {
        Self { paths }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PortalPaths {
    pub base: PathBuf,
    pub data_dir: PathBuf,
    pub store_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl PortalPaths {
    pub fn discover() -> Result<Self> {
        let exe_path = std::env::current_exe()
            .map_err(|err| anyhow!("failed to resolve current executable: {err}"))?;
        let base = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path missing parent"))?
            .to_path_buf();
        Self::from_base_dir(base)
    }

    pub fn from_base_dir<P: AsRef<Path>>(base: P) -> Result<Self> {
        let base = base.as_ref().to_path_buf();
        let data_dir = base.join("data");
        let store_path = data_dir.join("portal.db");
        let logs_dir = base.join("logs");

        Ok(Self {
            base,
            data_dir,
            store_path,
            logs_dir,
        })
    }
}
