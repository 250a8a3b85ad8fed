//! Directory layout of a dump

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Paths of everything written to a dump directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    base: PathBuf,
}

impl OutputLayout {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Root of the dump; diary pages and `index.html` live here
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn stylesheet_dir(&self) -> PathBuf {
        self.base.join("stylesheet")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.base.join("images")
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.base.join("scripts")
    }

    /// Directory of the files only this tool reads
    pub fn tools_dir(&self) -> PathBuf {
        self.base.join("tslove-tools")
    }

    pub fn stylesheet_file(&self) -> PathBuf {
        self.stylesheet_dir().join("tslove.css")
    }

    pub fn index_file(&self) -> PathBuf {
        self.base.join("index.html")
    }

    /// Local copy of a diary page
    pub fn entry_file(&self, id: &str) -> PathBuf {
        self.base.join(format!("{}.html", id))
    }

    /// Creates every directory of the layout that does not exist yet
    pub fn prepare(&self) -> io::Result<()> {
        for dir in [
            self.base.clone(),
            self.stylesheet_dir(),
            self.images_dir(),
            self.scripts_dir(),
            self.tools_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
